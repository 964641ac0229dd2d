use crate::{IndexerError, Result};
use ndarray::Array1;
use std::collections::BTreeMap;
use std::path::Path;

/// Integer identifier of an ingested corpus element.
pub type FeatureId = i64;

/// Relevance of each ranked element, in `[0, 1]` (1.0 is most relevant).
pub type RankMap = BTreeMap<FeatureId, f64>;

/// Mapping of element ids to feature vectors sharing one dimensionality.
///
/// The dimensionality is fixed by the first inserted vector; every later
/// insert must match it. Iteration is ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMap {
    dim: Option<usize>,
    vectors: BTreeMap<FeatureId, Array1<f64>>,
}

impl FeatureMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the vector for `id`.
    pub fn insert(&mut self, id: FeatureId, vector: Array1<f64>) -> Result<()> {
        if vector.is_empty() {
            return Err(IndexerError::InvalidFeatures(format!(
                "feature {id} is a zero-length vector"
            )));
        }
        if let Some(bad) = vector.iter().find(|v| !v.is_finite()) {
            return Err(IndexerError::InvalidFeatures(format!(
                "feature {id} contains non-finite value {bad}"
            )));
        }
        match self.dim {
            Some(expected) if expected != vector.len() => {
                return Err(IndexerError::DimensionMismatch {
                    id,
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dim = Some(vector.len()),
        }
        self.vectors.insert(id, vector);
        Ok(())
    }

    pub fn from_vecs<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FeatureId, Vec<f64>)>,
    {
        let mut map = Self::new();
        for (id, values) in entries {
            map.insert(id, Array1::from(values))?;
        }
        Ok(map)
    }

    /// Load a JSON object of the form `{ "<id>": [f64, ...], ... }`.
    pub fn load_json(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let raw: BTreeMap<FeatureId, Vec<f64>> = serde_json::from_slice(&bytes)?;
        Self::from_vecs(raw)
    }

    /// Dimensionality shared by every vector, `None` while empty.
    #[must_use]
    pub const fn dim(&self) -> Option<usize> {
        self.dim
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: FeatureId) -> Option<&Array1<f64>> {
        self.vectors.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: FeatureId) -> bool {
        self.vectors.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.vectors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &Array1<f64>)> {
        self.vectors.iter().map(|(id, v)| (*id, v))
    }
}

impl<'a> IntoIterator for &'a FeatureMap {
    type Item = (&'a FeatureId, &'a Array1<f64>);
    type IntoIter = std::collections::btree_map::Iter<'a, FeatureId, Array1<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}
