use media_indexer::IndexerType;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the module-level marker listing the indexer types a plugin exports.
pub const INDEXER_CLASS_MARKER: &str = "INDEXER_CLASS";

/// A value exported by a plugin module under some symbol name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// A constructible indexer type.
    Indexer(IndexerType),
    /// An ordered collection of exports.
    List(Vec<Export>),
    /// Anything else, described for error messages.
    Opaque(String),
}

impl Export {
    pub fn indexers(types: impl IntoIterator<Item = IndexerType>) -> Self {
        Self::List(types.into_iter().map(Self::Indexer).collect())
    }
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexer(kind) => write!(f, "indexer type {}", kind.name()),
            Self::List(items) => write!(f, "list of {} items", items.len()),
            Self::Opaque(what) => f.write_str(what),
        }
    }
}

/// The symbol table of one loaded plugin candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginModule {
    name: String,
    symbols: BTreeMap<String, Export>,
}

impl PluginModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, symbol: impl Into<String>, value: Export) -> Self {
        self.insert(symbol, value);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, value: Export) {
        self.symbols.insert(symbol.into(), value);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<&Export> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }
}
