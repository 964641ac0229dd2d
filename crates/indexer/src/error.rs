use crate::FeatureId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(
        "a model already exists for this indexer at {}; move or delete the existing model file(s) before generating another one",
        data_dir.display()
    )]
    ModelAlreadyExists { data_dir: PathBuf },

    #[error("no model available for this indexer")]
    NoModel,

    #[error("the given {0} has no content")]
    EmptyInput(&'static str),

    #[error("feature {id} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        id: FeatureId,
        expected: usize,
        actual: usize,
    },

    #[error("invalid features: {0}")]
    InvalidFeatures(String),

    #[error("ids not present in the model: {0:?}")]
    UnknownIds(Vec<FeatureId>),

    #[error("rank for id {id} is {score}, outside [0, 1]")]
    ScoreOutOfRange { id: FeatureId, score: f64 },

    #[error("corrupt model at {}: {reason}", path.display())]
    CorruptModel { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Other(String),
}
