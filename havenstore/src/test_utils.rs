//! Shared helpers for tests.

use crate::{Application, Config};
use axum_test::TestServer;
use std::path::Path;
use tempfile::TempDir;

/// Default configuration rooted at a throwaway directory.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.storage.root_dir = root.to_path_buf();
    config
}

/// Spin up an application over a throwaway storage root.
///
/// The returned `TempDir` must be kept alive for the duration of the test;
/// dropping it deletes the storage tree under the running server.
pub fn create_test_app() -> (TestServer, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(dir.path());
    let app = Application::new(config).expect("Failed to build application");
    (app.into_test_server(), dir)
}
