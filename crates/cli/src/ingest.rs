use anyhow::{Context, Result};
use media_indexer::json_io::{read_json, unix_now_ms, write_json_atomic};
use media_indexer::FeatureId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "ingest.json";

/// One ingested data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestEntry {
    /// File name inside the ingest directory.
    pub file: String,
    pub sha256: String,
    /// Where the file was copied from.
    pub source: PathBuf,
    pub added_at_unix_ms: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IngestManifest {
    next_id: FeatureId,
    entries: BTreeMap<FeatureId, IngestEntry>,
}

/// Result of [`DataIngest::add_data_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    New(FeatureId),
    /// Byte-identical content was already ingested under this id.
    Duplicate(FeatureId),
}

/// A directory of ingested media files with sequential ids.
///
/// Files are copied into `data_dir` as `<id>_<name>` and recorded in
/// `data_dir/ingest.json`, which is rewritten atomically after every add.
#[derive(Debug)]
pub struct DataIngest {
    data_dir: PathBuf,
    manifest: IngestManifest,
    by_hash: BTreeMap<String, FeatureId>,
}

impl DataIngest {
    /// Open the ingest rooted at `data_dir`, creating it and the scratch
    /// `work_dir` if absent.
    pub fn open(data_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let work_dir = work_dir.into();
        for dir in [&data_dir, &work_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
        }

        let manifest_path = data_dir.join(MANIFEST_FILE);
        let manifest: IngestManifest = read_json(&manifest_path)
            .with_context(|| {
                format!(
                    "Failed to read ingest manifest '{}'",
                    manifest_path.display()
                )
            })?
            .unwrap_or_default();
        let by_hash = manifest
            .entries
            .iter()
            .map(|(id, entry)| (entry.sha256.clone(), *id))
            .collect();

        log::debug!(
            "Opened ingest {} ({} files)",
            data_dir.display(),
            manifest.entries.len()
        );
        Ok(Self {
            data_dir,
            manifest,
            by_hash,
        })
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.manifest.entries.len()
    }

    /// Copy `path` into the ingest under the next free id. If the manifest
    /// cannot be written the copy is removed and the ingest is unchanged.
    pub fn add_data_file(&mut self, path: &Path) -> Result<Added> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
        let sha256 = format!("{:x}", Sha256::digest(&bytes));
        if let Some(&id) = self.by_hash.get(&sha256) {
            log::info!("Skipping {}: already ingested as {id}", path.display());
            return Ok(Added::Duplicate(id));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("'{}' has no usable file name", path.display()))?;
        let id = self.manifest.next_id;
        let file = format!("{id:06}_{name}");
        let target = self.data_dir.join(&file);
        std::fs::write(&target, &bytes)
            .with_context(|| format!("Failed to write '{}'", target.display()))?;

        self.manifest.entries.insert(
            id,
            IngestEntry {
                file,
                sha256: sha256.clone(),
                source: path.to_path_buf(),
                added_at_unix_ms: unix_now_ms(),
            },
        );
        self.manifest.next_id = id + 1;
        if let Err(e) = write_json_atomic(&self.data_dir.join(MANIFEST_FILE), &self.manifest) {
            self.manifest.entries.remove(&id);
            self.manifest.next_id = id;
            if let Err(cleanup) = std::fs::remove_file(&target) {
                log::warn!("Failed to remove '{}': {cleanup}", target.display());
            }
            return Err(e).context("Failed to write ingest manifest");
        }
        self.by_hash.insert(sha256, id);

        log::info!("Ingested {} as {id}", path.display());
        Ok(Added::New(id))
    }
}

/// Expand CLI arguments: existing files as-is, anything else as a glob.
pub fn expand_inputs(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        if path.is_file() {
            paths.push(path.to_path_buf());
            continue;
        }
        let matches = glob::glob(arg).with_context(|| format!("Invalid glob pattern '{arg}'"))?;
        let before = paths.len();
        for entry in matches {
            let entry = entry.context("Failed to read glob match")?;
            if entry.is_file() {
                paths.push(entry);
            }
        }
        if paths.len() == before {
            log::warn!("No files matched '{arg}'");
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn ingest(root: &TempDir) -> DataIngest {
        DataIngest::open(root.path().join("Images"), root.path().join("work/Images")).unwrap()
    }

    #[test]
    fn files_get_sequential_ids_and_survive_reopen() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.png");
        let b = root.path().join("b.png");
        std::fs::write(&a, b"alpha").unwrap();
        std::fs::write(&b, b"beta").unwrap();

        let mut first = ingest(&root);
        assert_eq!(first.add_data_file(&a).unwrap(), Added::New(0));
        assert_eq!(first.add_data_file(&b).unwrap(), Added::New(1));
        assert!(root.path().join("work/Images").is_dir());

        let reopened = ingest(&root);
        assert_eq!(reopened.len(), 2);
        let entry = &reopened.manifest.entries[&1];
        assert_eq!(entry.file, "000001_b.png");
        assert_eq!(
            std::fs::read(reopened.data_dir().join(&entry.file)).unwrap(),
            b"beta"
        );
    }

    #[test]
    fn identical_content_is_not_added_twice() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.png");
        let copy = root.path().join("copy.png");
        std::fs::write(&a, b"same").unwrap();
        std::fs::write(&copy, b"same").unwrap();

        let mut ingest = ingest(&root);
        assert_eq!(ingest.add_data_file(&a).unwrap(), Added::New(0));
        assert_eq!(ingest.add_data_file(&copy).unwrap(), Added::Duplicate(0));
        assert_eq!(ingest.len(), 1);
    }

    #[test]
    fn inputs_expand_globs_and_keep_plain_files() {
        let root = TempDir::new().unwrap();
        for name in ["x.jpg", "y.jpg", "z.txt"] {
            std::fs::write(root.path().join(name), name).unwrap();
        }
        let pattern = root.path().join("*.jpg").to_string_lossy().into_owned();
        let plain = root.path().join("z.txt").to_string_lossy().into_owned();

        let paths = expand_inputs(&[pattern, plain]).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.jpg", "y.jpg", "z.txt"]);
    }

    #[test]
    fn failed_manifest_write_leaves_ingest_unchanged() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.png");
        std::fs::write(&a, b"alpha").unwrap();

        let mut ingest = ingest(&root);
        // A directory where the temporary manifest goes makes the write fail.
        let blocker = ingest.data_dir().join("ingest.json.tmp");
        std::fs::create_dir_all(&blocker).unwrap();

        assert!(ingest.add_data_file(&a).is_err());
        assert_eq!(ingest.len(), 0);
        assert_eq!(ingest.manifest.next_id, 0);
        assert!(!ingest.data_dir().join("000000_a.png").exists());
        assert!(!ingest.data_dir().join("ingest.json").exists());

        std::fs::remove_dir(&blocker).unwrap();
        assert_eq!(ingest.add_data_file(&a).unwrap(), Added::New(0));
    }
}
