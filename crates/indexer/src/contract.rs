use crate::{FeatureId, FeatureMap, IndexerDirs, Parallelism, RankMap, Result};
use std::fmt;

/// Implementation side of the indexer lifecycle.
///
/// Backends are only ever driven through [`crate::Indexer`], which enforces
/// the shared preconditions (model presence, non-empty input) before calling
/// in here. Every method must either succeed or leave both persisted and
/// in-memory state untouched.
pub trait IndexBackend: Send + Sync {
    /// True iff a usable persisted or in-memory model exists. Backends that
    /// need no model return true unconditionally.
    fn has_model(&self) -> bool;

    /// Build a new model from `features` and persist it under the data
    /// directory. Called only when no model exists and `features` is not empty.
    fn generate(
        &mut self,
        dirs: &IndexerDirs,
        features: &FeatureMap,
        parallelism: Parallelism,
    ) -> Result<()>;

    /// Fold `features` into the in-memory model. Called only when a model
    /// exists and `features` is not empty.
    fn extend(&mut self, features: &FeatureMap, parallelism: Parallelism) -> Result<()>;

    /// Relevance of the indexed elements given exemplar ids. Called only when
    /// a model exists.
    fn rank(&self, positive: &[FeatureId], negative: &[FeatureId]) -> Result<RankMap>;

    /// Drop every in-memory extension, returning to the last generated model.
    fn reset_extensions(&mut self) -> Result<()>;
}

/// Static identity and constructor of a concrete backend.
pub trait IndexerKind: IndexBackend + Sized + 'static {
    /// Registry name of the type.
    const NAME: &'static str;

    const DESCRIPTION: &'static str = "";

    /// Open an instance over the given directories, picking up any model
    /// already persisted in the data directory.
    fn open(dirs: &IndexerDirs) -> Result<Self>;
}

type Constructor = fn(&IndexerDirs) -> Result<Box<dyn IndexBackend>>;

/// A constructible indexer type, the unit stored in the plugin registry.
#[derive(Clone, Copy)]
pub struct IndexerType {
    name: &'static str,
    description: &'static str,
    construct: Constructor,
}

impl IndexerType {
    #[must_use]
    pub fn of<T: IndexerKind>() -> Self {
        Self {
            name: T::NAME,
            description: T::DESCRIPTION,
            construct: open_boxed::<T>,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    pub(crate) fn open_backend(&self, dirs: &IndexerDirs) -> Result<Box<dyn IndexBackend>> {
        (self.construct)(dirs)
    }
}

fn open_boxed<T: IndexerKind>(dirs: &IndexerDirs) -> Result<Box<dyn IndexBackend>> {
    Ok(Box::new(T::open(dirs)?))
}

impl fmt::Debug for IndexerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for IndexerType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for IndexerType {}
