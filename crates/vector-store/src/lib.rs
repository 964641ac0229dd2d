//! # Media Vector Store
//!
//! Built-in indexers over unit-normalised feature vectors.
//!
//! ## Architecture
//!
//! ```text
//! FeatureMap
//!     │
//!     ├──> VectorModel
//!     │      ├─ base vectors   (data_dir/<model>.json, written atomically)
//!     │      └─ overlay        (online extensions, memory only)
//!     │
//!     ├──> CentroidIndexer         cosine to exemplar centroids
//!     └──> NearestNeighborIndexer  cosine to closest exemplar
//! ```
//!
//! Both types are exported to the registry through one static plugin module
//! (`vector_store`) carrying an `INDEXER_CLASS` list.

mod centroid;
mod model;
mod nearest;
mod scoring;

pub use centroid::CentroidIndexer;
pub use model::{ModelFile, VectorModel, MODEL_FILE_SCHEMA_VERSION};
pub use nearest::NearestNeighborIndexer;

use media_indexer::IndexerType;
use media_registry::{Export, PluginModule, StaticSource, INDEXER_CLASS_MARKER};

/// Candidate name of the built-in plugin module.
pub const BUILTIN_MODULE: &str = "vector_store";

/// Every indexer type implemented by this crate.
#[must_use]
pub fn indexer_types() -> Vec<IndexerType> {
    vec![
        IndexerType::of::<CentroidIndexer>(),
        IndexerType::of::<NearestNeighborIndexer>(),
    ]
}

#[must_use]
pub fn builtin_module() -> PluginModule {
    PluginModule::new(BUILTIN_MODULE).with(INDEXER_CLASS_MARKER, Export::indexers(indexer_types()))
}

/// Plugin source holding only the modules linked into this crate.
#[must_use]
pub fn builtin_source() -> StaticSource {
    StaticSource::new("built-in").with_module(builtin_module())
}
