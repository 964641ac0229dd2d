use crate::config::SystemConfig;
use crate::ingest::{expand_inputs, Added, DataIngest};
use anyhow::{Context, Result};
use clap::ValueEnum;
use media_indexer::{FeatureId, FeatureMap, Indexer, ModelState, Parallelism};
use media_registry::IndexerRegistry;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Kind of media held by an ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IngestType {
    Image,
    Video,
}

impl IngestType {
    fn subdir(self, config: &SystemConfig) -> &str {
        match self {
            Self::Image => &config.ingest.image,
            Self::Video => &config.ingest.video,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub data_dir: PathBuf,
    pub added: Vec<FeatureId>,
    pub duplicates: Vec<FeatureId>,
    pub total: usize,
}

pub fn ingest(
    config: &SystemConfig,
    kind: IngestType,
    target_dir: Option<&Path>,
    inputs: &[String],
) -> Result<IngestReport> {
    let subdir = kind.subdir(config);
    let data_dir = target_dir.map_or_else(|| config.data_dir.join(subdir), Path::to_path_buf);
    let mut ingest = DataIngest::open(data_dir, config.work_dir.join(subdir))?;

    let files = expand_inputs(inputs)?;
    log::debug!("Ingest inputs: {files:?}");

    let mut report = IngestReport {
        data_dir: ingest.data_dir().to_path_buf(),
        added: Vec::new(),
        duplicates: Vec::new(),
        total: 0,
    };
    for file in &files {
        match ingest.add_data_file(file)? {
            Added::New(id) => report.added.push(id),
            Added::Duplicate(id) => report.duplicates.push(id),
        }
    }
    report.total = ingest.len();
    Ok(report)
}

#[derive(Debug, Serialize)]
pub struct IndexerInfo {
    pub name: String,
    pub description: String,
}

pub fn list_indexers(registry: &IndexerRegistry) -> Vec<IndexerInfo> {
    registry
        .iter()
        .map(|(name, kind)| IndexerInfo {
            name: name.to_string(),
            description: kind.description().to_string(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub indexer: String,
    pub has_model: bool,
    pub state: &'static str,
    pub data_dir: PathBuf,
    pub work_dir: PathBuf,
}

fn open_indexer(config: &SystemConfig, registry: &IndexerRegistry, name: &str) -> Result<Indexer> {
    registry
        .create(name, config.indexer_dirs(name))
        .with_context(|| format!("Failed to open indexer '{name}'"))
}

const fn state_label(state: ModelState) -> &'static str {
    match state {
        ModelState::NoModel => "no_model",
        ModelState::Ready => "ready",
        ModelState::Extended => "extended",
    }
}

pub fn status(
    config: &SystemConfig,
    registry: &IndexerRegistry,
    name: &str,
) -> Result<StatusReport> {
    let indexer = open_indexer(config, registry, name)?;
    Ok(StatusReport {
        indexer: indexer.name().to_string(),
        has_model: indexer.has_model(),
        state: state_label(indexer.state()),
        data_dir: indexer.dirs().data_dir_path().to_path_buf(),
        work_dir: indexer.dirs().work_dir_path().to_path_buf(),
    })
}

fn load_features(path: &Path) -> Result<FeatureMap> {
    FeatureMap::load_json(path)
        .with_context(|| format!("Failed to load features from '{}'", path.display()))
}

pub fn generate(
    config: &SystemConfig,
    registry: &IndexerRegistry,
    name: &str,
    features: &Path,
    parallelism: Parallelism,
) -> Result<StatusReport> {
    let features = load_features(features)?;
    let mut indexer = open_indexer(config, registry, name)?;
    indexer
        .generate_model(&features, parallelism)
        .with_context(|| format!("{name}: model generation failed"))?;
    status(config, registry, name)
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RankedElement {
    pub id: FeatureId,
    pub score: f64,
}

pub struct RankRequest<'a> {
    pub positive: &'a [FeatureId],
    pub negative: &'a [FeatureId],
    pub extend: &'a [PathBuf],
    pub limit: Option<usize>,
    pub parallelism: Parallelism,
}

/// Apply in-memory extensions, then rank. Results are sorted by descending
/// score, ties by ascending id.
pub fn rank(
    config: &SystemConfig,
    registry: &IndexerRegistry,
    name: &str,
    request: &RankRequest<'_>,
) -> Result<Vec<RankedElement>> {
    let mut indexer = open_indexer(config, registry, name)?;
    for path in request.extend {
        let features = load_features(path)?;
        indexer
            .extend_model(&features, request.parallelism)
            .with_context(|| format!("{name}: extending with '{}' failed", path.display()))?;
    }

    let ranks = indexer
        .rank_model(request.positive, request.negative)
        .with_context(|| format!("{name}: ranking failed"))?;
    let mut ranked: Vec<RankedElement> = ranks
        .into_iter()
        .map(|(id, score)| RankedElement { id, score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    if let Some(limit) = request.limit {
        ranked.truncate(limit);
    }
    Ok(ranked)
}
