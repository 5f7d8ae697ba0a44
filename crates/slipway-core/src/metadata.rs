use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::effects::MetadataStore;

/// Filesystem-backed metadata store: one file per key under a fixed
/// directory, each file holding a raw string value. Values are overwritten
/// whole; a trailing newline is tolerated on read.
pub struct SystemMetadataStore {
    dir: PathBuf,
}

impl SystemMetadataStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl MetadataStore for SystemMetadataStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.dir.join(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading metadata {}", path.display()))?;
        Ok(Some(raw.trim_end_matches('\n').to_string()))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating metadata dir {}", self.dir.display()))?;
        let path = self.dir.join(key);
        std::fs::write(&path, value)
            .with_context(|| format!("writing metadata {}", path.display()))
    }

    fn exists(&self, key: &str) -> bool {
        self.dir.join(key).exists()
    }
}
