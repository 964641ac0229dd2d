use anyhow::{Context, Result};
use media_indexer::IndexerDirs;
use media_registry::{IndexerRegistry, ManifestDirSource};
use media_vector_store::{builtin_source, indexer_types};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MEDIA_INDEX_CONFIG";

const APP_DIR: &str = "media-index";
const CONFIG_FILE: &str = "config.toml";

/// System-wide settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Root of persisted data (ingests, models).
    pub data_dir: PathBuf,
    /// Root of scratch space.
    pub work_dir: PathBuf,
    /// Directory of plugin manifests; the built-in indexers when unset.
    pub plugin_dir: Option<PathBuf>,
    pub ingest: IngestConfig,
}

/// Sub-directory names of the per-type ingests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub image: String,
    pub video: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            image: "Images".to_string(),
            video: "Videos".to_string(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            data_dir: root.join("data"),
            work_dir: root.join("work"),
            plugin_dir: None,
            ingest: IngestConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Load a TOML configuration file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;

        if let Some(base) = path.parent() {
            config.data_dir = base.join(&config.data_dir);
            config.work_dir = base.join(&config.work_dir);
            config.plugin_dir = config.plugin_dir.map(|dir| base.join(dir));
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration: `explicit`, then `$MEDIA_INDEX_CONFIG`,
    /// then the per-user config file, then built-in defaults.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        if let Some(path) = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE)) {
            if path.is_file() {
                return Self::load(&path);
            }
        }
        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let names = [
            ("ingest.image", &self.ingest.image),
            ("ingest.video", &self.ingest.video),
        ];
        for (key, name) in names {
            if name.is_empty() {
                errors.push(format!("{key} must not be empty"));
            } else if Path::new(name).is_absolute() {
                errors.push(format!("{key} must be a relative directory name"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }

    /// Data and work directories of the indexer registered as `name`.
    #[must_use]
    pub fn indexer_dirs(&self, name: &str) -> IndexerDirs {
        IndexerDirs::new(
            self.data_dir.join("indexers").join(name),
            self.work_dir.join("indexers").join(name),
        )
    }

    /// Discover the indexer registry this configuration points at.
    pub fn registry(&self) -> Result<IndexerRegistry> {
        let registry = match &self.plugin_dir {
            Some(dir) => IndexerRegistry::discover(&ManifestDirSource::new(dir, indexer_types())),
            None => IndexerRegistry::discover(&builtin_source()),
        };
        registry.context("Indexer plugin discovery failed")
    }
}
