//! Test helpers: build AppState and router for integration tests.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use cbxpdf_api::constants::API_PREFIX;
use cbxpdf_api::setup::routes;
use cbxpdf_api::AppState;
use cbxpdf_core::Config;
use serde_json::Value;

/// API path with the version prefix, e.g. `/api/v1/archives`
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// POST one archive and return the response
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> TestResponse {
        self.upload_many(vec![(name, bytes)]).await
    }

    pub async fn upload_many(&self, files: Vec<(&str, Vec<u8>)>) -> TestResponse {
        let mut form = MultipartForm::new();
        for (name, bytes) in files {
            form = form.add_part(
                "file",
                Part::bytes(bytes)
                    .file_name(name.to_string())
                    .mime_type("application/octet-stream"),
            );
        }
        self.server.post(&api_path("/archives")).multipart(form).await
    }

    /// Upload and return the new archive's id
    pub async fn upload_id(&self, name: &str, bytes: Vec<u8>) -> String {
        let response = self.upload(name, bytes).await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        let body: Value = response.json();
        body["files"][0]["id"].as_str().unwrap().to_string()
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(Config::for_tests())
}

/// Fresh state and router over the given configuration
pub fn setup_test_app_with(config: Config) -> TestApp {
    let state = AppState::new(config.clone()).expect("Failed to create app state");
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");
    TestApp { server, state }
}
