use media_indexer::IndexerError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("[{candidate}] failed to load plugin: {reason}")]
    Load { candidate: String, reason: String },

    #[error("[{candidate}] invalid plugin export: {reason}")]
    PluginExport { candidate: String, reason: String },

    #[error("cannot scan plugin directory {}: {reason}", path.display())]
    PluginDir { path: PathBuf, reason: String },

    #[error("no indexer type named `{0}` is registered")]
    UnknownIndexer(String),

    #[error("Indexer error: {0}")]
    IndexerError(#[from] IndexerError),
}

impl RegistryError {
    pub(crate) fn load(candidate: &str, reason: impl Into<String>) -> Self {
        Self::Load {
            candidate: candidate.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn export(candidate: &str, reason: impl Into<String>) -> Self {
        Self::PluginExport {
            candidate: candidate.to_string(),
            reason: reason.into(),
        }
    }
}
