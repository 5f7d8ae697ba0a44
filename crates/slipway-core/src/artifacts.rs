use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::effects::ArtifactCache;

/// Cross-build cache of whole directory trees, keyed by the tree's
/// app-relative name. Entries are stored and restored wholesale, never
/// per-file.
pub struct SystemArtifactCache {
    app_root: PathBuf,
    cache_root: PathBuf,
}

impl SystemArtifactCache {
    #[must_use]
    pub fn new(app_root: PathBuf, cache_root: PathBuf) -> Self {
        Self {
            app_root,
            cache_root,
        }
    }
}

impl ArtifactCache for SystemArtifactCache {
    fn store(&self, name: &str) -> Result<()> {
        let source = self.app_root.join(name);
        if !source.exists() {
            debug!(name, "nothing to cache, source tree missing");
            return Ok(());
        }
        let entry = self.cache_root.join(name);
        if entry.exists() {
            std::fs::remove_dir_all(&entry)
                .with_context(|| format!("clearing cache entry {}", entry.display()))?;
        }
        copy_tree(&source, &entry)?;
        debug!(name, "cached artifact tree");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<bool> {
        let entry = self.cache_root.join(name);
        if !entry.exists() {
            return Ok(false);
        }
        let dest = self.app_root.join(name);
        if dest.exists() {
            std::fs::remove_dir_all(&dest)
                .with_context(|| format!("clearing {}", dest.display()))?;
        }
        copy_tree(&entry, &dest)?;
        debug!(name, "restored artifact tree from cache");
        Ok(true)
    }
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;
    let mut stack = vec![source.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("reading dir {}", dir.display()))?
        {
            let entry = entry?;
            let entry_path = entry.path();
            let relative = entry_path
                .strip_prefix(source)
                .context("walked path escaped the source tree")?;
            let target = dest.join(relative);
            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                std::fs::create_dir_all(&target)
                    .with_context(|| format!("creating {}", target.display()))?;
                stack.push(entry_path);
            } else if metadata.is_file() {
                std::fs::copy(&entry_path, &target).with_context(|| {
                    format!("copying {} to {}", entry_path.display(), target.display())
                })?;
            }
        }
    }
    Ok(())
}
