//! # Media Indexer
//!
//! Lifecycle contract shared by every indexer of the media retrieval pipeline.
//!
//! ## Lifecycle
//!
//! ```text
//! FeatureMap (id -> vector)
//!     │
//!     ├──> generate_model   persist a new model under data_dir
//!     ├──> extend_model     fold more features in, in memory only
//!     ├──> rank_model       score every element in [0, 1] from exemplars
//!     └──> reset            drop extensions, back to the persisted model
//! ```
//!
//! Implementations provide an [`IndexBackend`]; callers only ever see the
//! [`Indexer`] wrapper, which enforces the shared preconditions.
//!
//! ## Example
//!
//! ```no_run
//! use media_indexer::{FeatureMap, Indexer, IndexerDirs, IndexerType, Parallelism};
//!
//! fn build(kind: IndexerType, features: &FeatureMap) -> media_indexer::Result<()> {
//!     let dirs = IndexerDirs::new("/var/lib/media/data", "/tmp/media/work");
//!     let mut indexer = Indexer::open(kind, dirs)?;
//!     if !indexer.has_model() {
//!         indexer.generate_model(features, Parallelism::all())?;
//!     }
//!     let ranks = indexer.rank_model(&[1, 2], &[7])?;
//!     println!("{} ranked elements", ranks.len());
//!     Ok(())
//! }
//! ```

mod contract;
mod dirs;
mod error;
mod features;
mod indexer;
pub mod json_io;
mod parallelism;

pub use contract::{IndexBackend, IndexerKind, IndexerType};
pub use dirs::IndexerDirs;
pub use error::{IndexerError, Result};
pub use features::{FeatureId, FeatureMap, RankMap};
pub use indexer::{Indexer, ModelState};
pub use parallelism::Parallelism;
