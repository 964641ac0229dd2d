//! End-to-end runs of the `media-index` binary against temporary directories.

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new(extra_config: &str) -> Self {
        let root = TempDir::new().unwrap();
        let config = format!("data_dir = \"data\"\nwork_dir = \"work\"\n{extra_config}");
        std::fs::write(root.path().join("config.toml"), config).unwrap();
        Self { root }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::cargo_bin("media-index")
            .unwrap()
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .args(args)
            .env_remove("MEDIA_INDEX_CONFIG")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert!(
            out.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8(out.stdout).unwrap()
    }

    fn write_features(&self, name: &str, json: &str) -> String {
        let path = self.path().join(name);
        std::fs::write(&path, json).unwrap();
        path.to_string_lossy().into_owned()
    }
}

const FEATURES: &str = r#"{
    "0": [1.0, 0.0],
    "1": [0.9, 0.1],
    "2": [0.0, 1.0],
    "3": [0.1, 0.9]
}"#;

#[test]
fn lists_builtin_indexers() {
    let ws = Workspace::new("");
    let stdout = ws.run_ok(&["indexers"]);
    let names: Vec<&str> = stdout
        .lines()
        .map(|line| line.split('\t').next().unwrap())
        .collect();
    assert_eq!(names, vec!["CentroidIndexer", "NearestNeighborIndexer"]);
}

#[test]
fn generate_status_and_rank_round_trip() {
    let ws = Workspace::new("");
    let features = ws.write_features("features.json", FEATURES);

    let status: Value =
        serde_json::from_str(&ws.run_ok(&["status", "--indexer", "CentroidIndexer"])).unwrap();
    assert_eq!(status["has_model"], Value::Bool(false));

    ws.run_ok(&[
        "generate",
        "--indexer",
        "CentroidIndexer",
        "--features",
        &features,
        "--parallel",
        "2",
    ]);
    assert!(ws
        .path()
        .join("data/indexers/CentroidIndexer/centroid_model.json")
        .is_file());

    let status: Value =
        serde_json::from_str(&ws.run_ok(&["status", "--indexer", "CentroidIndexer"])).unwrap();
    assert_eq!(status["state"], Value::from("ready"));

    let ranked: Value = serde_json::from_str(&ws.run_ok(&[
        "rank",
        "--indexer",
        "CentroidIndexer",
        "--positive",
        "0",
        "--negative",
        "2",
        "--limit",
        "2",
    ]))
    .unwrap();
    let ids: Vec<i64> = ranked
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn second_generate_is_refused_with_guidance() {
    let ws = Workspace::new("");
    let features = ws.write_features("features.json", FEATURES);
    let args = [
        "generate",
        "--indexer",
        "NearestNeighborIndexer",
        "--features",
        features.as_str(),
    ];
    ws.run_ok(&args);

    let out = ws.run(&args);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("move or delete"), "{stderr}");
}

#[test]
fn rank_extensions_are_session_only() {
    let ws = Workspace::new("");
    let features = ws.write_features("features.json", FEATURES);
    let extra = ws.write_features("extra.json", r#"{ "9": [1.0, 0.05] }"#);
    ws.run_ok(&["generate", "-i", "CentroidIndexer", "-f", &features]);

    let ranked: Value = serde_json::from_str(&ws.run_ok(&[
        "rank", "-i", "CentroidIndexer", "-p", "0", "-e", &extra,
    ]))
    .unwrap();
    assert_eq!(ranked.as_array().unwrap().len(), 5);

    let out = ws.run(&["rank", "-i", "CentroidIndexer", "-p", "9"]);
    assert!(!out.status.success());
}

#[test]
fn unknown_indexer_fails() {
    let ws = Workspace::new("");
    let out = ws.run(&["status", "--indexer", "NoSuchIndexer"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("NoSuchIndexer"));
}

#[test]
fn ingest_copies_files_once() {
    let ws = Workspace::new("[ingest]\nimage = \"Photos\"\n");
    let src = ws.path().join("incoming");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("a.jpg"), b"first").unwrap();
    std::fs::write(src.join("b.jpg"), b"second").unwrap();
    std::fs::write(src.join("c.jpg"), b"first").unwrap();

    let pattern = src.join("*.jpg").to_string_lossy().into_owned();
    let report: Value =
        serde_json::from_str(&ws.run_ok(&["ingest", "-t", "image", &pattern])).unwrap();
    assert_eq!(report["added"], serde_json::json!([0, 1]));
    assert_eq!(report["duplicates"], serde_json::json!([0]));

    let manifest: Value = serde_json::from_slice(
        &std::fs::read(ws.path().join("data/Photos/ingest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["next_id"], Value::from(2));
    assert!(ws.path().join("work/Photos").is_dir());

    let out = ws.run(&["ingest", "-t", "audio", &pattern]);
    assert!(!out.status.success());
}

#[test]
fn plugin_directory_limits_registered_types() {
    let ws = Workspace::new("plugin_dir = \"plugins\"\n");
    let plugins = ws.path().join("plugins");
    std::fs::create_dir_all(&plugins).unwrap();
    std::fs::write(plugins.join("centroid.toml"), "INDEXER_CLASS = \"CentroidIndexer\"\n").unwrap();
    std::fs::write(plugins.join("_draft.toml"), "not = [valid").unwrap();

    assert_eq!(ws.run_ok(&["indexers"]).lines().count(), 1);

    std::fs::write(plugins.join("broken.toml"), "broken = 42\n").unwrap();
    let out = ws.run(&["indexers"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("broken"));
}
