use crate::model::VectorModel;
use crate::scoring::{centroid, cosine, to_rank};
use media_indexer::{
    FeatureId, FeatureMap, IndexBackend, IndexerDirs, IndexerError, IndexerKind, Parallelism,
    RankMap, Result,
};

const MODEL_FILE: &str = "centroid_model.json";

/// Ranks elements by cosine similarity to the centroid of the positive
/// exemplars, pushed down by similarity to the negative centroid.
#[derive(Debug)]
pub struct CentroidIndexer {
    model: VectorModel,
}

impl CentroidIndexer {
    #[must_use]
    pub const fn model(&self) -> &VectorModel {
        &self.model
    }
}

impl IndexerKind for CentroidIndexer {
    const NAME: &'static str = "CentroidIndexer";
    const DESCRIPTION: &'static str =
        "cosine similarity to the positive exemplar centroid, minus the negative centroid";

    fn open(dirs: &IndexerDirs) -> Result<Self> {
        Ok(Self {
            model: VectorModel::open(dirs, Self::NAME, MODEL_FILE)?,
        })
    }
}

impl IndexBackend for CentroidIndexer {
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
        let positive = self.model.exemplars(positive)?;
        let negative = self.model.exemplars(negative)?;
        let pos_center =
            centroid(&positive).ok_or(IndexerError::EmptyInput("positive exemplar set"))?;
        let neg_center = centroid(&negative);

        Ok(self
            .model
            .entries()
            .map(|(id, v)| {
                let p = cosine(v, &pos_center);
                let n = neg_center.as_ref().map(|c| cosine(v, c));
                (id, to_rank(p, n))
            })
            .collect())
    }

    fn reset_extensions(&mut self) -> Result<()> {
        self.model.reset();
        Ok(())
    }
}
