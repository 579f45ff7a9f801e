//! Test helpers: build the real router over an isolated staging directory.
//!
//! Run from workspace root: `cargo test -p recast-api --test convert_test`.

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use recast_core::{Config, ConverterConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

/// Upload limit used by every test app.
pub const TEST_MAX_UPLOAD_MB: usize = 1;

/// Test application: server plus the staging directory it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Everything currently present in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging_dir.path())
            .expect("read staging dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect()
    }

    pub fn assert_staging_empty(&self) {
        let leftover = self.staged_files();
        assert!(leftover.is_empty(), "staged files left behind: {:?}", leftover);
    }
}

/// Setup a test app with its own staging directory and no OCR binary.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Same as [`setup_test_app`], with extra configuration entries.
pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let staging_dir = TempDir::new().expect("create staging dir");

    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert(
        "STAGING_DIR".to_string(),
        staging_dir.path().display().to_string(),
    );
    vars.insert(
        "MAX_UPLOAD_SIZE_MB".to_string(),
        TEST_MAX_UPLOAD_MB.to_string(),
    );
    vars.insert(
        "TESSERACT_PATH".to_string(),
        "/nonexistent/recast-test-tesseract".to_string(),
    );
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let converter_config =
        ConverterConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config");
    let config = Config(Box::new(converter_config));

    let (_state, router) = recast_api::setup::initialize_app(config)
        .await
        .expect("initialize app");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        staging_dir,
    }
}

/// Multipart form with a single `file` part.
pub fn file_form(filename: &str, mime: &str, data: impl Into<Vec<u8>>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data.into())
            .file_name(filename.to_string())
            .mime_type(mime.to_string()),
    )
}

/// Filename from a `Content-Disposition: attachment; filename="..."` header.
pub fn attachment_filename(content_disposition: &str) -> String {
    content_disposition
        .split("filename=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .expect("attachment filename")
        .to_string()
}
