use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use slipway_domain::FingerprintBuilder;

use crate::effects::ContentFingerprinter;

/// Fingerprints the configured asset source paths on disk.
///
/// Sources are visited in their configured order; files inside a directory
/// source are visited in sorted path order so the digest is independent of
/// readdir ordering. Sources that do not exist contribute nothing.
pub struct TreeFingerprinter;

impl ContentFingerprinter for TreeFingerprinter {
    fn fingerprint(&self, app_root: &Path, sources: &[String]) -> Result<String> {
        let mut builder = FingerprintBuilder::new();
        for source in sources {
            let path = app_root.join(source);
            if path.is_file() {
                add_file(&mut builder, app_root, &path)?;
            } else if path.is_dir() {
                for file in collect_files(&path)? {
                    add_file(&mut builder, app_root, &file)?;
                }
            }
        }
        Ok(builder.finish())
    }
}

fn add_file(builder: &mut FingerprintBuilder, app_root: &Path, path: &Path) -> Result<()> {
    let relative = path
        .strip_prefix(app_root)
        .context("asset source escaped the app root")?;
    let contents =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    builder.add_file(&relative.to_string_lossy().replace('\\', "/"), &contents);
    Ok(())
}

fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in
            std::fs::read_dir(&dir).with_context(|| format!("reading dir {}", dir.display()))?
        {
            let entry = entry?;
            let entry_path = entry.path();
            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                stack.push(entry_path);
            } else if metadata.is_file() {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    Ok(files)
}
