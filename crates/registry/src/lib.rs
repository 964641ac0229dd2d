//! # Media Registry
//!
//! Discovers indexer implementations at startup and keeps them in a
//! name-keyed registry.
//!
//! ## Discovery
//!
//! ```text
//! PluginSource (static modules | manifest directory)
//!     │ candidates(), sorted, hidden names skipped
//!     ▼
//! load(candidate) ──> PluginModule { symbol -> Export }
//!     │
//!     ├─ INDEXER_CLASS        one indexer type or a list of them
//!     ├─ <candidate name>     a single indexer type
//!     └─ neither              PluginExport error
//!     ▼
//! IndexerRegistry { name -> IndexerType }
//! ```
//!
//! Any load failure, invalid export or duplicate type name aborts discovery.
//!
//! ## Example
//!
//! ```no_run
//! use media_indexer::IndexerDirs;
//! use media_registry::{discover, PluginSource};
//!
//! fn open_centroid(source: &dyn PluginSource) -> media_registry::Result<()> {
//!     let registry = discover(source)?;
//!     let indexer = registry.create(
//!         "CentroidIndexer",
//!         IndexerDirs::new("/var/lib/media/CentroidIndexer", "/tmp/media/CentroidIndexer"),
//!     )?;
//!     println!("model present: {}", indexer.has_model());
//!     Ok(())
//! }
//! ```

mod discovery;
mod error;
mod manifest;
mod module;
mod registry;
mod source;

pub use discovery::discover;
pub use error::{RegistryError, Result};
pub use manifest::ManifestDirSource;
pub use module::{Export, PluginModule, INDEXER_CLASS_MARKER};
pub use registry::IndexerRegistry;
pub use source::{PluginSource, StaticSource};
