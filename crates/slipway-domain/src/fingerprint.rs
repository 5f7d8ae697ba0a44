use sha2::{Digest, Sha256};

/// Accumulates an ordered sequence of asset inputs into a stable digest.
///
/// The digest covers both the app-relative path and the contents of every
/// file fed in, so renames, edits, additions, and removals all produce a
/// different fingerprint. The caller is responsible for feeding files in a
/// deterministic order; the builder makes no attempt to sort.
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn add_file(&mut self, relative_path: &str, contents: &[u8]) {
        self.hasher.update(b"path:");
        self.hasher.update(relative_path.as_bytes());
        self.hasher.update(b"\n");
        self.hasher.update((contents.len() as u64).to_le_bytes());
        self.hasher.update(contents);
    }

    /// Finishes the digest as lowercase hex.
    #[must_use]
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(entries: &[(&str, &[u8])]) -> String {
        let mut builder = FingerprintBuilder::new();
        for (path, contents) in entries {
            builder.add_file(path, contents);
        }
        builder.finish()
    }

    #[test]
    fn identical_inputs_produce_identical_digests() {
        let a = digest(&[("app/assets/app.js", b"alert(1)")]);
        let b = digest(&[("app/assets/app.js", b"alert(1)")]);
        assert_eq!(a, b);
    }

    #[test]
    fn changing_one_byte_changes_the_digest() {
        let a = digest(&[("app/assets/app.js", b"alert(1)")]);
        let b = digest(&[("app/assets/app.js", b"alert(2)")]);
        assert_ne!(a, b);
    }

    #[test]
    fn renaming_a_file_changes_the_digest() {
        let a = digest(&[("app/assets/app.js", b"alert(1)")]);
        let b = digest(&[("app/assets/main.js", b"alert(1)")]);
        assert_ne!(a, b);
    }

    #[test]
    fn file_order_is_significant() {
        let a = digest(&[("a.js", b"x"), ("b.js", b"y")]);
        let b = digest(&[("b.js", b"y"), ("a.js", b"x")]);
        assert_ne!(a, b);
    }

    #[test]
    fn boundary_between_path_and_contents_is_unambiguous() {
        let a = digest(&[("a", b"bc")]);
        let b = digest(&[("ab", b"c")]);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_input_still_produces_a_digest() {
        let empty = digest(&[]);
        assert_eq!(empty.len(), 64);
    }
}
