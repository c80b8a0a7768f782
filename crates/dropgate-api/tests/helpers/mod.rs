//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p dropgate-api --test upload_test`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use dropgate_api::setup::routes;
use dropgate_api::state::AppState;
use dropgate_core::{Config, GatewayConfig};
use dropgate_storage::{LocalStorage, Storage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server plus the storage it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub storage_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Objects stored under the `images/` prefix.
    pub fn stored_objects(&self) -> Vec<String> {
        list_files(&self.storage_root.join("images"))
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Configuration for a local-storage gateway rooted at `storage_path`.
/// `overrides` take precedence over the defaults.
pub fn create_test_config(storage_path: &Path, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("STORAGE_BACKEND".to_string(), "local".to_string());
    vars.insert(
        "LOCAL_STORAGE_PATH".to_string(),
        storage_path.to_string_lossy().to_string(),
    );
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let gateway = GatewayConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test config");
    Config(Box::new(gateway))
}

/// Server around an arbitrary storage backend.
pub fn test_server(config: Config, storage: Arc<dyn Storage>) -> TestServer {
    let state = Arc::new(AppState::new(&config, storage));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to start test server")
}

/// Setup test app backed by local storage in a temp directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_root = temp_dir.path().to_path_buf();
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(storage_root.clone())
            .await
            .expect("Failed to create local storage"),
    );

    let config = create_test_config(&storage_root, overrides);

    TestApp {
        server: test_server(config, storage),
        storage_root,
        _temp_dir: temp_dir,
    }
}

/// Multipart form with every file under the `files` field, in order.
pub fn files_form(files: Vec<(&str, &str, Vec<u8>)>) -> MultipartForm {
    files
        .into_iter()
        .fold(MultipartForm::new(), |form, (name, mime, data)| {
            form.add_part(
                "files",
                Part::bytes(bytes::Bytes::from(data))
                    .file_name(name.to_string())
                    .mime_type(mime.to_string()),
            )
        })
}
