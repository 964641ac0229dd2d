use crate::model::VectorModel;
use crate::scoring::{cosine, to_rank};
use media_indexer::{
    FeatureId, FeatureMap, IndexBackend, IndexerDirs, IndexerError, IndexerKind, Parallelism,
    RankMap, Result,
};
use ndarray::Array1;

const MODEL_FILE: &str = "nearest_neighbor_model.json";

/// Ranks elements by their closest positive exemplar, pushed down by their
/// closest negative exemplar.
#[derive(Debug)]
pub struct NearestNeighborIndexer {
    model: VectorModel,
}

impl NearestNeighborIndexer {
    #[must_use]
    pub const fn model(&self) -> &VectorModel {
        &self.model
    }
}

impl IndexerKind for NearestNeighborIndexer {
    const NAME: &'static str = "NearestNeighborIndexer";
    const DESCRIPTION: &'static str =
        "maximum cosine similarity to any positive exemplar, minus the closest negative";

    fn open(dirs: &IndexerDirs) -> Result<Self> {
        Ok(Self {
            model: VectorModel::open(dirs, Self::NAME, MODEL_FILE)?,
        })
    }
}

fn closest(v: &Array1<f64>, exemplars: &[&Array1<f64>]) -> Option<f64> {
    exemplars
        .iter()
        .map(|e| cosine(v, e))
        .fold(None, |best, s| Some(best.map_or(s, |b: f64| b.max(s))))
}

impl IndexBackend for NearestNeighborIndexer {
    fn has_model(&self) -> bool {
        self.model.has_model()
    }

    fn generate(
        &mut self,
        dirs: &IndexerDirs,
        features: &FeatureMap,
        parallelism: Parallelism,
    ) -> Result<()> {
        self.model.generate(dirs, features, parallelism)
    }

    fn extend(&mut self, features: &FeatureMap, parallelism: Parallelism) -> Result<()> {
        self.model.extend(features, parallelism)
    }

    fn rank(&self, positive: &[FeatureId], negative: &[FeatureId]) -> Result<RankMap> {
        if positive.is_empty() {
            return Err(IndexerError::EmptyInput("positive exemplar set"));
        }
        let positive = self.model.exemplars(positive)?;
        let negative = self.model.exemplars(negative)?;

        let mut ranks = RankMap::new();
        for (id, v) in self.model.entries() {
            let p = closest(v, &positive).unwrap_or(-1.0);
            ranks.insert(id, to_rank(p, closest(v, &negative)));
        }
        Ok(ranks)
    }

    fn reset_extensions(&mut self) -> Result<()> {
        self.model.reset();
        Ok(())
    }
}
