use crate::scoring::normalize;
use media_indexer::json_io::{read_json, unix_now_ms, write_json_atomic};
use media_indexer::{FeatureId, FeatureMap, IndexerDirs, IndexerError, Parallelism, Result};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const MODEL_FILE_SCHEMA_VERSION: u32 = 1;

/// On-disk representation of a generated vector model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub schema_version: u32,
    pub indexer: String,
    pub dim: usize,
    pub built_at_unix_ms: u64,
    pub vectors: BTreeMap<FeatureId, Vec<f64>>,
}

type Vectors = BTreeMap<FeatureId, Array1<f64>>;

#[derive(Debug)]
struct BaseModel {
    dim: usize,
    vectors: Vectors,
}

/// Unit-normalised vectors of the generated model plus an in-memory overlay
/// of online extensions.
///
/// The overlay shadows base entries with the same id and is never persisted.
/// A model file written by another instance sharing the data directory is
/// picked up on first use.
#[derive(Debug)]
pub struct VectorModel {
    indexer: &'static str,
    path: PathBuf,
    base: OnceLock<BaseModel>,
    overlay: Vectors,
}

impl VectorModel {
    /// Open the model stored as `file_name` in the data directory, if any.
    pub fn open(dirs: &IndexerDirs, indexer: &'static str, file_name: &str) -> Result<Self> {
        let model = Self {
            indexer,
            path: dirs.data_dir_path().join(file_name),
            base: OnceLock::new(),
            overlay: Vectors::new(),
        };
        if let Some(base) = model.loaded()? {
            log::debug!(
                "[{indexer}] Loaded model {} ({} vectors, dim={})",
                model.path.display(),
                base.vectors.len(),
                base.dim
            );
        }
        Ok(model)
    }

    /// The base model, read from disk on first access.
    fn loaded(&self) -> Result<Option<&BaseModel>> {
        if let Some(base) = self.base.get() {
            return Ok(Some(base));
        }
        let stored = match read_json::<ModelFile>(&self.path) {
            Ok(stored) => stored,
            Err(IndexerError::JsonError(e)) => return Err(self.corrupt(e)),
            Err(e) => return Err(e),
        };
        match stored {
            Some(file) => {
                let base = self.validate(file)?;
                Ok(Some(self.base.get_or_init(|| base)))
            }
            None => Ok(None),
        }
    }

    fn require_loaded(&self) -> Result<&BaseModel> {
        self.loaded()?.ok_or(IndexerError::NoModel)
    }

    fn validate(&self, file: ModelFile) -> Result<BaseModel> {
        if file.schema_version != MODEL_FILE_SCHEMA_VERSION {
            return Err(self.corrupt(format!(
                "unsupported schema version {}",
                file.schema_version
            )));
        }
        if file.indexer != self.indexer {
            return Err(self.corrupt(format!(
                "model was generated by {}, not {}",
                file.indexer, self.indexer
            )));
        }
        if file.vectors.is_empty() {
            return Err(self.corrupt("model holds no vectors"));
        }
        if let Some((id, v)) = file.vectors.iter().find(|(_, v)| v.len() != file.dim) {
            return Err(self.corrupt(format!(
                "vector {id} has dimension {}, expected {}",
                v.len(),
                file.dim
            )));
        }

        Ok(BaseModel {
            dim: file.dim,
            vectors: file
                .vectors
                .into_iter()
                .map(|(id, v)| (id, Array1::from(v)))
                .collect(),
        })
    }

    fn corrupt(&self, reason: impl ToString) -> IndexerError {
        IndexerError::CorruptModel {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// True once a model is loaded or persisted at [`Self::path`], including
    /// one written by another instance since this one was opened.
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.base.get().is_some() || self.path.is_file()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dimensionality of the loaded model (0 when none is loaded).
    #[must_use]
    pub fn dim(&self) -> usize {
        self.base.get().map_or(0, |b| b.dim)
    }

    /// Number of distinct ids, extensions included.
    #[must_use]
    pub fn len(&self) -> usize {
        let Some(base) = self.base.get() else {
            return 0;
        };
        base.vectors.len()
            + self
                .overlay
                .keys()
                .filter(|id| !base.vectors.contains_key(id))
                .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_extended(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Normalise `features`, persist them and make them the base model.
    ///
    /// Never replaces a model file already present in the data directory.
    pub fn generate(
        &mut self,
        dirs: &IndexerDirs,
        features: &FeatureMap,
        parallelism: Parallelism,
    ) -> Result<()> {
        if self.has_model() {
            return Err(IndexerError::ModelAlreadyExists {
                data_dir: dirs.data_dir_path().to_path_buf(),
            });
        }
        let dim = features
            .dim()
            .ok_or(IndexerError::EmptyInput("feature map"))?;
        let vectors = normalize_all(features, parallelism)?;

        dirs.data_dir()?;
        let file = ModelFile {
            schema_version: MODEL_FILE_SCHEMA_VERSION,
            indexer: self.indexer.to_string(),
            dim,
            built_at_unix_ms: unix_now_ms(),
            vectors: vectors.iter().map(|(id, v)| (*id, v.to_vec())).collect(),
        };
        write_json_atomic(&self.path, &file)?;

        log::info!(
            "[{}] Wrote model {} ({} vectors, dim={dim})",
            self.indexer,
            self.path.display(),
            vectors.len()
        );
        self.base = OnceLock::from(BaseModel { dim, vectors });
        self.overlay.clear();
        Ok(())
    }

    /// Add `features` to the overlay. The whole batch is validated before
    /// anything is applied.
    pub fn extend(&mut self, features: &FeatureMap, parallelism: Parallelism) -> Result<()> {
        let expected = self.require_loaded()?.dim;
        if let Some(actual) = features.dim() {
            if actual != expected {
                let id = features.ids().next().unwrap_or_default();
                return Err(IndexerError::DimensionMismatch {
                    id,
                    expected,
                    actual,
                });
            }
        }

        let vectors = normalize_all(features, parallelism)?;
        self.overlay.extend(vectors);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.overlay.clear();
    }

    /// Vector for `id`, extensions first.
    #[must_use]
    pub fn vector(&self, id: FeatureId) -> Option<&Array1<f64>> {
        self.overlay
            .get(&id)
            .or_else(|| self.base.get().and_then(|b| b.vectors.get(&id)))
    }

    /// Every id in the model, ascending, paired with its current vector.
    pub fn entries(&self) -> impl Iterator<Item = (FeatureId, &Array1<f64>)> {
        let ids: BTreeSet<FeatureId> = self
            .base
            .get()
            .into_iter()
            .flat_map(|b| b.vectors.keys())
            .chain(self.overlay.keys())
            .copied()
            .collect();
        ids.into_iter()
            .filter_map(move |id| self.vector(id).map(|v| (id, v)))
    }

    /// Resolve exemplar ids, failing with every id the model does not hold.
    /// Loads a model persisted by another instance if needed.
    pub fn exemplars(&self, ids: &[FeatureId]) -> Result<Vec<&Array1<f64>>> {
        self.require_loaded()?;
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            match self.vector(id) {
                Some(v) => found.push(v),
                None => missing.push(id),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            missing.sort_unstable();
            missing.dedup();
            Err(IndexerError::UnknownIds(missing))
        }
    }
}

fn normalize_all(features: &FeatureMap, parallelism: Parallelism) -> Result<Vectors> {
    let entries: Vec<(FeatureId, &Array1<f64>)> = features.iter().collect();
    let normalized: Vec<(FeatureId, Array1<f64>)> = parallelism.install(|| {
        entries
            .par_iter()
            .map(|(id, v)| (*id, normalize(v)))
            .collect()
    })?;
    Ok(normalized.into_iter().collect())
}
