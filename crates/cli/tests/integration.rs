//! Integration tests for osync
//!
//! These tests require a running S3-compatible server with an existing bucket.
//!
//! Run with:
//! ```bash
//! # Start RustFS container and create a bucket named "osync-test"
//! docker run -d --name rustfs -p 9000:9000 -p 9001:9001 \
//!     -v rustfs-data:/data \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:1.0.0-alpha.81
//!
//! # Run tests
//! TEST_S3_ENDPOINT=http://localhost:9000 TEST_S3_ACCESS_KEY=accesskey \
//! TEST_S3_SECRET_KEY=secretkey TEST_S3_BUCKET=osync-test \
//! cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;

use tempfile::TempDir;

/// S3 test configuration from environment
struct TestStore {
    endpoint: String,
    access_key: String,
    secret_key: String,
    bucket: String,
}

fn get_test_config() -> Option<TestStore> {
    Some(TestStore {
        endpoint: std::env::var("TEST_S3_ENDPOINT").ok()?,
        access_key: std::env::var("TEST_S3_ACCESS_KEY").ok()?,
        secret_key: std::env::var("TEST_S3_SECRET_KEY").ok()?,
        bucket: std::env::var("TEST_S3_BUCKET").ok()?,
    })
}

/// Run osync with an isolated config directory and the test store in the environment
fn run_osync(args: &[&str], config_dir: &Path, store: Option<&TestStore>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_osync"));
    cmd.args(args)
        .env("OSYNC_CONFIG_DIR", config_dir)
        .env_remove("OSYNC_BUCKET")
        .arg("--no-progress");

    if let Some(store) = store {
        cmd.env("OSYNC_ENDPOINT", &store.endpoint)
            .env("OSYNC_ACCESS_KEY", &store.access_key)
            .env("OSYNC_SECRET_KEY", &store.secret_key)
            .env("OSYNC_BUCKET", &store.bucket);
    }

    cmd.output().expect("Failed to execute osync command")
}

/// Wait for the S3 service to respond to list requests
fn wait_for_s3_ready(config_dir: &Path, store: &TestStore) -> bool {
    for _ in 0..30 {
        let output = run_osync(&["ls", "--json", "--summarize"], config_dir, Some(store));
        if output.status.success() {
            return true;
        }
        std::thread::sleep(Duration::from_secs(1));
    }
    false
}

/// Generate unique prefix for test resources
fn unique_prefix(name: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("it-{name}-{:x}/", duration.as_nanos() % 0xFFFFFFFF)
}

fn setup() -> Option<(TestStore, TempDir)> {
    let store = match get_test_config() {
        Some(store) => store,
        None => {
            eprintln!("Skipping: S3 test config not available");
            return None;
        }
    };
    let config_dir = tempfile::tempdir().expect("Failed to create temp dir");
    assert!(
        wait_for_s3_ready(config_dir.path(), &store),
        "S3 service did not become ready in time"
    );
    Some((store, config_dir))
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "Invalid JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

mod folder_operations {
    use super::*;

    #[test]
    fn test_upload_copy_download_round_trip() {
        let Some((store, config_dir)) = setup() else {
            return;
        };
        let base = unique_prefix("base");
        let code = unique_prefix("code");

        let local = tempfile::tempdir().unwrap();
        write_tree(
            local.path(),
            &[
                ("main.py", "print('hello')"),
                ("lib/util.py", "def util(): pass"),
                ("lib/deep/data.json", "{}"),
            ],
        );

        let output = run_osync(
            &[
                "upload",
                &base,
                local.path().to_str().unwrap(),
                "--recursive",
                "--json",
            ],
            config_dir.path(),
            Some(&store),
        );
        assert!(
            output.status.success(),
            "Upload failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(json_stdout(&output)["succeeded"], 3);

        let output = run_osync(
            &["copy", &base, &code, "--json", "--concurrency", "2"],
            config_dir.path(),
            Some(&store),
        );
        assert!(output.status.success(), "Copy failed");
        let summary = json_stdout(&output);
        assert_eq!(summary["succeeded"], 3);
        assert_eq!(summary["failed"], 0);

        let target = tempfile::tempdir().unwrap();
        let output = run_osync(
            &["download", &code, target.path().to_str().unwrap(), "--json"],
            config_dir.path(),
            Some(&store),
        );
        assert!(output.status.success(), "Download failed");

        assert_eq!(
            std::fs::read_to_string(target.path().join("main.py")).unwrap(),
            "print('hello')"
        );
        assert_eq!(
            std::fs::read_to_string(target.path().join("lib/deep/data.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_copy_paginates_with_small_pages() {
        let Some((store, config_dir)) = setup() else {
            return;
        };
        let source = unique_prefix("pages-src");
        let destination = unique_prefix("pages-dst");

        let local = tempfile::tempdir().unwrap();
        let files: Vec<(String, String)> = (0..7)
            .map(|i| (format!("f{i}.txt"), format!("file {i}")))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        write_tree(local.path(), &refs);

        let output = run_osync(
            &["upload", &source, local.path().to_str().unwrap(), "-r"],
            config_dir.path(),
            Some(&store),
        );
        assert!(output.status.success());

        let output = run_osync(
            &["config", "set", "transfer.page_size", "3"],
            config_dir.path(),
            None,
        );
        assert!(output.status.success());

        let output = run_osync(
            &["copy", &source, &destination, "--json"],
            config_dir.path(),
            Some(&store),
        );
        assert!(output.status.success());
        let summary = json_stdout(&output);
        assert_eq!(summary["pages"], 3);
        assert_eq!(summary["succeeded"], 7);
    }

    #[test]
    fn test_upload_from_stdin_and_project() {
        let Some((store, config_dir)) = setup() else {
            return;
        };
        let templates = unique_prefix("templates");
        let projects = unique_prefix("projects");

        let mut child = Command::new(env!("CARGO_BIN_EXE_osync"))
            .args(["upload", &format!("{templates}python/"), "-", "--name", "main.py"])
            .env("OSYNC_CONFIG_DIR", config_dir.path())
            .env("OSYNC_ENDPOINT", &store.endpoint)
            .env("OSYNC_ACCESS_KEY", &store.access_key)
            .env("OSYNC_SECRET_KEY", &store.secret_key)
            .env("OSYNC_BUCKET", &store.bucket)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()
            .expect("spawn osync");
        {
            use std::io::Write;
            let mut stdin = child.stdin.take().unwrap();
            stdin.write_all(b"print('template')").unwrap();
        }
        assert!(child.wait_with_output().unwrap().status.success());

        for (key, value) in [
            ("project.template_root", templates.trim_end_matches('/')),
            ("project.project_root", projects.trim_end_matches('/')),
        ] {
            let output = run_osync(&["config", "set", key, value], config_dir.path(), None);
            assert!(output.status.success());
        }

        let output = run_osync(
            &["project", "abc123", "--language", "python", "--json"],
            config_dir.path(),
            Some(&store),
        );
        assert!(
            output.status.success(),
            "Project failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let summary = json_stdout(&output);
        assert_eq!(summary["succeeded"], 1);
        assert_eq!(summary["destination"], format!("{projects}abc123/"));
    }

    #[test]
    fn test_copy_into_own_subtree_is_usage_error() {
        let Some((store, config_dir)) = setup() else {
            return;
        };
        let source = unique_prefix("subtree");

        let output = run_osync(
            &["copy", &source, &format!("{source}nested/")],
            config_dir.path(),
            Some(&store),
        );
        assert_eq!(output.status.code(), Some(2));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_missing_bucket_is_usage_error() {
        let config_dir = tempfile::tempdir().unwrap();
        let output = run_osync(&["ls"], config_dir.path(), None);
        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stderr).contains("bucket"));
    }

    #[test]
    fn test_config_set_and_show() {
        let config_dir = tempfile::tempdir().unwrap();

        let output = run_osync(
            &["config", "set", "store.secret_key", "hunter2"],
            config_dir.path(),
            None,
        );
        assert!(output.status.success());

        let output = run_osync(&["config", "show", "--json"], config_dir.path(), None);
        assert!(output.status.success());
        let config = json_stdout(&output);
        assert_eq!(config["store"]["secret_key"], "********");
        assert_eq!(config["transfer"]["concurrency"], 16);

        let output = run_osync(&["config", "path"], config_dir.path(), None);
        let path = String::from_utf8_lossy(&output.stdout);
        assert!(path.trim().ends_with("config.toml"));
    }
}
