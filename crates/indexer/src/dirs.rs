use crate::Result;
use std::path::{Path, PathBuf};

/// Data and work directories of one indexer instance.
///
/// Several instances may share a `data_dir` (the persisted model) while each
/// owns its own `work_dir`. Both are created on first access and never
/// removed by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerDirs {
    data_dir: PathBuf,
    work_dir: PathBuf,
}

impl IndexerDirs {
    pub fn new(data_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Persisted model directory, created if absent.
    pub fn data_dir(&self) -> Result<&Path> {
        ensure_dir(&self.data_dir)?;
        Ok(&self.data_dir)
    }

    /// Scratch directory, created if absent.
    pub fn work_dir(&self) -> Result<&Path> {
        ensure_dir(&self.work_dir)?;
        Ok(&self.work_dir)
    }

    /// Configured data directory without touching the filesystem.
    #[must_use]
    pub fn data_dir_path(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn work_dir_path(&self) -> &Path {
        &self.work_dir
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        log::debug!("Creating directory {}", path.display());
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
