use crate::contract::{IndexBackend, IndexerType};
use crate::error::{IndexerError, Result};
use crate::{FeatureId, FeatureMap, IndexerDirs, Parallelism, RankMap};
use std::fmt;
use std::time::Instant;

/// Lifecycle position of an [`Indexer`] instance.
///
/// ```text
/// NoModel --generate--> Ready --extend--> Extended --extend--> Extended
///                         ^                  |
///                         +------reset-------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    NoModel,
    Ready,
    Extended,
}

/// A named indexer instance bound to its data and work directories.
///
/// This is the caller-facing surface: it enforces the preconditions shared by
/// every implementation and delegates the actual work to the backend.
pub struct Indexer {
    kind: IndexerType,
    dirs: IndexerDirs,
    backend: Box<dyn IndexBackend>,
    extended: bool,
    log_target: String,
}

impl Indexer {
    /// Construct an instance of `kind` over `dirs`.
    pub fn open(kind: IndexerType, dirs: IndexerDirs) -> Result<Self> {
        let backend = kind.open_backend(&dirs)?;
        let log_target = format!("media_indexer::{}", kind.name());
        log::debug!(
            target: log_target.as_str(),
            "Opened indexer (data_dir={}, work_dir={}, has_model={})",
            dirs.data_dir_path().display(),
            dirs.work_dir_path().display(),
            backend.has_model()
        );
        Ok(Self {
            kind,
            dirs,
            backend,
            extended: false,
            log_target,
        })
    }

    /// Indexer type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[must_use]
    pub const fn kind(&self) -> IndexerType {
        self.kind
    }

    /// Logging target for this instance (`media_indexer::<Name>`).
    #[must_use]
    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    #[must_use]
    pub const fn dirs(&self) -> &IndexerDirs {
        &self.dirs
    }

    #[must_use]
    pub fn state(&self) -> ModelState {
        if !self.backend.has_model() {
            ModelState::NoModel
        } else if self.extended {
            ModelState::Extended
        } else {
            ModelState::Ready
        }
    }

    #[must_use]
    pub fn has_model(&self) -> bool {
        self.backend.has_model()
    }

    /// Generate and persist a new model from `features`.
    ///
    /// Refuses to run when a model already exists: the existing model has to
    /// be moved or deleted by hand first.
    pub fn generate_model(
        &mut self,
        features: &FeatureMap,
        parallelism: Parallelism,
    ) -> Result<()> {
        if self.backend.has_model() {
            log::warn!(
                target: self.log_target.as_str(),
                "Refusing to overwrite existing model in {}",
                self.dirs.data_dir_path().display()
            );
            return Err(IndexerError::ModelAlreadyExists {
                data_dir: self.dirs.data_dir_path().to_path_buf(),
            });
        }
        if features.is_empty() {
            return Err(IndexerError::EmptyInput("feature map"));
        }

        let start = Instant::now();
        log::info!(
            target: self.log_target.as_str(),
            "Generating model from {} features (dim={}, workers={})",
            features.len(),
            features.dim().unwrap_or(0),
            parallelism.resolve()
        );
        self.backend.generate(&self.dirs, features, parallelism)?;
        self.extended = false;
        log::info!(
            target: self.log_target.as_str(),
            "Model generated in {} ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Extend the in-memory model. Nothing is written to the data directory.
    pub fn extend_model(&mut self, features: &FeatureMap, parallelism: Parallelism) -> Result<()> {
        self.require_model()?;
        if features.is_empty() {
            return Err(IndexerError::EmptyInput("feature map"));
        }

        self.backend.extend(features, parallelism)?;
        self.extended = true;
        log::debug!(
            target: self.log_target.as_str(),
            "Extended model with {} features",
            features.len()
        );
        Ok(())
    }

    /// Rank the model against positive and negative exemplar ids.
    ///
    /// Every returned score lies in `[0, 1]`.
    pub fn rank_model(&self, positive: &[FeatureId], negative: &[FeatureId]) -> Result<RankMap> {
        self.require_model()?;

        let ranks = self.backend.rank(positive, negative)?;
        if let Some((&id, &score)) = ranks
            .iter()
            .find(|(_, score)| !(score.is_finite() && (0.0..=1.0).contains(*score)))
        {
            log::error!(
                target: self.log_target.as_str(),
                "Backend produced out-of-range rank {score} for {id}"
            );
            return Err(IndexerError::ScoreOutOfRange { id, score });
        }
        log::debug!(
            target: self.log_target.as_str(),
            "Ranked {} elements (positive={}, negative={})",
            ranks.len(),
            positive.len(),
            negative.len()
        );
        Ok(ranks)
    }

    /// Discard online extensions, returning to the last generated model.
    pub fn reset(&mut self) -> Result<()> {
        self.require_model()?;
        self.backend.reset_extensions()?;
        self.extended = false;
        log::debug!(target: self.log_target.as_str(), "Model reset to persisted state");
        Ok(())
    }

    fn require_model(&self) -> Result<()> {
        if self.backend.has_model() {
            Ok(())
        } else {
            Err(IndexerError::NoModel)
        }
    }
}

impl fmt::Debug for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexer")
            .field("name", &self.kind.name())
            .field("dirs", &self.dirs)
            .field("state", &self.state())
            .finish()
    }
}
