use crate::{discover, PluginSource, RegistryError, Result};
use media_indexer::{Indexer, IndexerDirs, IndexerType};
use std::collections::BTreeMap;

/// Name to type mapping produced by discovery. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct IndexerRegistry {
    types: BTreeMap<String, IndexerType>,
}

impl IndexerRegistry {
    pub(crate) fn from_types(types: BTreeMap<String, IndexerType>) -> Self {
        Self { types }
    }

    /// Shorthand for [`discover`].
    pub fn discover(source: &dyn PluginSource) -> Result<Self> {
        discover(source)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexerType> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexerType)> {
        self.types.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    /// Open an instance of the type registered as `name`.
    pub fn create(&self, name: &str, dirs: IndexerDirs) -> Result<Indexer> {
        let kind = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownIndexer(name.to_string()))?;
        Ok(Indexer::open(*kind, dirs)?)
    }
}
