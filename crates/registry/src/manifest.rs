use crate::{Export, PluginModule, PluginSource, RegistryError, Result};
use media_indexer::IndexerType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MANIFEST_EXTENSION: &str = "toml";
const PACKAGE_MANIFEST: &str = "plugin.toml";

/// Plugin candidates described by TOML manifests in a directory.
///
/// `<dir>/<name>.toml` and `<dir>/<name>/plugin.toml` both define candidate
/// `<name>`. Every sub-directory is a candidate; one without `plugin.toml`
/// fails to load. Top-level manifest keys are the module's symbols: strings
/// naming a type from the catalog become indexer types, arrays become lists,
/// and everything else is opaque.
///
/// ```toml
/// INDEXER_CLASS = ["CentroidIndexer", "NearestNeighborIndexer"]
/// ```
#[derive(Debug, Clone)]
pub struct ManifestDirSource {
    dir: PathBuf,
    catalog: BTreeMap<&'static str, IndexerType>,
}

impl ManifestDirSource {
    pub fn new(dir: impl Into<PathBuf>, catalog: impl IntoIterator<Item = IndexerType>) -> Self {
        Self {
            dir: dir.into(),
            catalog: catalog.into_iter().map(|t| (t.name(), t)).collect(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self, candidate: &str) -> Option<PathBuf> {
        let file = self.dir.join(format!("{candidate}.{MANIFEST_EXTENSION}"));
        if file.is_file() {
            return Some(file);
        }
        let package = self.dir.join(candidate).join(PACKAGE_MANIFEST);
        package.is_file().then_some(package)
    }

    fn resolve(&self, value: &toml::Value) -> Export {
        match value {
            toml::Value::String(name) => match self.catalog.get(name.as_str()) {
                Some(kind) => Export::Indexer(*kind),
                None => Export::Opaque(format!("string {name:?}")),
            },
            toml::Value::Array(items) => {
                Export::List(items.iter().map(|item| self.resolve(item)).collect())
            }
            other => Export::Opaque(other.type_str().to_string()),
        }
    }
}

impl PluginSource for ManifestDirSource {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn candidates(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(RegistryError::PluginDir {
                path: self.dir.clone(),
                reason: "not a directory".to_string(),
            });
        }

        let mut names = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| RegistryError::PluginDir {
                path: self.dir.clone(),
                reason: e.to_string(),
            })?;
            let path = entry.path();

            let name = if entry.file_type().is_dir() {
                path.file_name()
            } else if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
                path.file_stem()
            } else {
                log::debug!("Ignoring non-manifest file {}", path.display());
                continue;
            };
            let name = name
                .and_then(|n| n.to_str())
                .ok_or_else(|| RegistryError::PluginDir {
                    path: self.dir.clone(),
                    reason: format!("entry name is not valid UTF-8: {}", path.display()),
                })?;
            names.push(name.to_string());
        }
        Ok(names)
    }

    fn load(&self, candidate: &str) -> Result<PluginModule> {
        let path = self.manifest_path(candidate).ok_or_else(|| {
            RegistryError::load(
                candidate,
                format!(
                    "no manifest found (expected {candidate}.{MANIFEST_EXTENSION} \
                     or {candidate}/{PACKAGE_MANIFEST})"
                ),
            )
        })?;
        log::debug!("[{candidate}] Reading manifest {}", path.display());

        let content = std::fs::read_to_string(&path)
            .map_err(|e| RegistryError::load(candidate, format!("{}: {e}", path.display())))?;
        let table: toml::Table = content
            .parse()
            .map_err(|e| RegistryError::load(candidate, format!("{}: {e}", path.display())))?;

        let mut module = PluginModule::new(candidate);
        for (key, value) in &table {
            module.insert(key.clone(), self.resolve(value));
        }
        Ok(module)
    }
}
