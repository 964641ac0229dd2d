//! Precondition and state-machine tests for the `Indexer` wrapper.

use media_indexer::json_io::{read_json, write_json_atomic};
use media_indexer::{
    FeatureId, FeatureMap, IndexBackend, Indexer, IndexerDirs, IndexerError, IndexerKind,
    IndexerType, ModelState, Parallelism, RankMap, Result,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

const MODEL_FILE: &str = "memo.json";

/// Remembers ids; ranks exemplars by membership.
struct MemoIndexer {
    model_path: PathBuf,
    base: Option<BTreeSet<FeatureId>>,
    extra: BTreeSet<FeatureId>,
}

impl IndexBackend for MemoIndexer {
    fn has_model(&self) -> bool {
        self.base.is_some()
    }

    fn generate(
        &mut self,
        dirs: &IndexerDirs,
        features: &FeatureMap,
        _parallelism: Parallelism,
    ) -> Result<()> {
        let ids: BTreeSet<FeatureId> = features.ids().collect();
        self.model_path = dirs.data_dir()?.join(MODEL_FILE);
        write_json_atomic(&self.model_path, &ids)?;
        self.base = Some(ids);
        Ok(())
    }

    fn extend(&mut self, features: &FeatureMap, _parallelism: Parallelism) -> Result<()> {
        self.extra.extend(features.ids());
        Ok(())
    }

    fn rank(&self, positive: &[FeatureId], negative: &[FeatureId]) -> Result<RankMap> {
        let base = self.base.as_ref().ok_or(IndexerError::NoModel)?;
        Ok(base
            .iter()
            .chain(self.extra.iter())
            .map(|id| {
                let score = if positive.contains(id) {
                    1.0
                } else if negative.contains(id) {
                    0.0
                } else {
                    0.5
                };
                (*id, score)
            })
            .collect())
    }

    fn reset_extensions(&mut self) -> Result<()> {
        self.extra.clear();
        Ok(())
    }
}

impl IndexerKind for MemoIndexer {
    const NAME: &'static str = "MemoIndexer";

    fn open(dirs: &IndexerDirs) -> Result<Self> {
        let model_path = dirs.data_dir_path().join(MODEL_FILE);
        let base = read_json(&model_path)?;
        Ok(Self {
            model_path,
            base,
            extra: BTreeSet::new(),
        })
    }
}

/// Violates the rank postcondition.
struct SloppyIndexer;

impl IndexBackend for SloppyIndexer {
    fn has_model(&self) -> bool {
        true
    }

    fn generate(&mut self, _: &IndexerDirs, _: &FeatureMap, _: Parallelism) -> Result<()> {
        Ok(())
    }

    fn extend(&mut self, _: &FeatureMap, _: Parallelism) -> Result<()> {
        Ok(())
    }

    fn rank(&self, _: &[FeatureId], _: &[FeatureId]) -> Result<RankMap> {
        Ok([(1, 0.25), (2, 1.5)].into_iter().collect())
    }

    fn reset_extensions(&mut self) -> Result<()> {
        Ok(())
    }
}

impl IndexerKind for SloppyIndexer {
    const NAME: &'static str = "SloppyIndexer";

    fn open(_: &IndexerDirs) -> Result<Self> {
        Ok(Self)
    }
}

fn features(ids: &[FeatureId]) -> FeatureMap {
    FeatureMap::from_vecs(ids.iter().map(|&id| (id, vec![id as f64, 1.0]))).unwrap()
}

fn open(root: &TempDir) -> Indexer {
    let dirs = IndexerDirs::new(root.path().join("data"), root.path().join("work"));
    Indexer::open(IndexerType::of::<MemoIndexer>(), dirs).unwrap()
}

#[test]
fn generate_transitions_to_ready() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);
    assert_eq!(indexer.name(), "MemoIndexer");
    assert_eq!(indexer.log_target(), "media_indexer::MemoIndexer");
    assert!(!indexer.has_model());
    assert_eq!(indexer.state(), ModelState::NoModel);

    indexer
        .generate_model(&features(&[1, 2, 3]), Parallelism::all())
        .unwrap();

    assert!(indexer.has_model());
    assert_eq!(indexer.state(), ModelState::Ready);
    assert!(root.path().join("data").join(MODEL_FILE).exists());
}

#[test]
fn second_generate_fails_and_keeps_model_bytes() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);
    indexer
        .generate_model(&features(&[1, 2]), Parallelism::threads(1))
        .unwrap();
    let model_path = root.path().join("data").join(MODEL_FILE);
    let before = std::fs::read(&model_path).unwrap();

    let err = indexer
        .generate_model(&features(&[5, 6, 7]), Parallelism::all())
        .unwrap_err();

    assert!(matches!(err, IndexerError::ModelAlreadyExists { .. }));
    assert!(err.to_string().contains("move or delete"));
    assert_eq!(std::fs::read(&model_path).unwrap(), before);
    assert_eq!(indexer.state(), ModelState::Ready);
}

#[test]
fn persisted_model_blocks_generation_in_a_new_instance() {
    let root = TempDir::new().unwrap();
    open(&root)
        .generate_model(&features(&[1]), Parallelism::all())
        .unwrap();

    let mut other = open(&root);
    assert!(other.has_model());
    assert!(matches!(
        other.generate_model(&features(&[2]), Parallelism::all()),
        Err(IndexerError::ModelAlreadyExists { .. })
    ));
}

#[test]
fn empty_generate_fails_without_model() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);

    let err = indexer
        .generate_model(&FeatureMap::new(), Parallelism::all())
        .unwrap_err();

    assert!(matches!(err, IndexerError::EmptyInput(_)));
    assert!(!indexer.has_model());
    assert_eq!(indexer.state(), ModelState::NoModel);
}

#[test]
fn model_operations_require_a_model() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);

    assert!(matches!(
        indexer.extend_model(&features(&[1]), Parallelism::all()),
        Err(IndexerError::NoModel)
    ));
    assert!(matches!(
        indexer.rank_model(&[1], &[]),
        Err(IndexerError::NoModel)
    ));
    assert!(matches!(indexer.reset(), Err(IndexerError::NoModel)));
    assert_eq!(indexer.state(), ModelState::NoModel);
}

#[test]
fn extend_then_reset_restores_generated_ranking() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);
    indexer
        .generate_model(&features(&[1, 2, 3]), Parallelism::all())
        .unwrap();
    let baseline = indexer.rank_model(&[1], &[3]).unwrap();

    indexer
        .extend_model(&features(&[4, 5]), Parallelism::all())
        .unwrap();
    assert_eq!(indexer.state(), ModelState::Extended);
    indexer
        .extend_model(&features(&[6]), Parallelism::all())
        .unwrap();
    assert_eq!(indexer.state(), ModelState::Extended);
    assert_eq!(indexer.rank_model(&[1], &[3]).unwrap().len(), 6);

    indexer.reset().unwrap();
    assert_eq!(indexer.state(), ModelState::Ready);
    assert_eq!(indexer.rank_model(&[1], &[3]).unwrap(), baseline);
}

#[test]
fn empty_extension_is_rejected_without_transition() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);
    indexer
        .generate_model(&features(&[1]), Parallelism::all())
        .unwrap();

    assert!(matches!(
        indexer.extend_model(&FeatureMap::new(), Parallelism::all()),
        Err(IndexerError::EmptyInput(_))
    ));
    assert_eq!(indexer.state(), ModelState::Ready);
}

#[test]
fn rank_is_deterministic_and_bounded() {
    let root = TempDir::new().unwrap();
    let mut indexer = open(&root);
    indexer
        .generate_model(&features(&[1, 2, 3, 4]), Parallelism::all())
        .unwrap();

    let first = indexer.rank_model(&[2], &[4]).unwrap();
    let second = indexer.rank_model(&[2], &[4]).unwrap();

    assert_eq!(first, second);
    assert!(first.values().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn out_of_range_backend_scores_are_reported() {
    let root = TempDir::new().unwrap();
    let dirs = IndexerDirs::new(root.path().join("d"), root.path().join("w"));
    let indexer = Indexer::open(IndexerType::of::<SloppyIndexer>(), dirs).unwrap();

    let err = indexer.rank_model(&[1], &[]).unwrap_err();
    assert!(matches!(
        err,
        IndexerError::ScoreOutOfRange { id: 2, score } if score == 1.5
    ));
}
