use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use polecat_csv::{Polecat, PolecatConfig};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

#[allow(dead_code)]
pub fn fixture_json(relative: impl AsRef<Path>) -> serde_json::Value {
    serde_json::from_str(&read_fixture(relative)).expect("fixture should be valid JSON")
}

#[allow(dead_code)]
pub fn config(server: &MockServer) -> PolecatConfig {
    PolecatConfig::new(TOKEN)
        .with_url(format!("{}/graphql", server.uri()))
        .with_page_size(2)
        .with_timeout(Duration::from_secs(5))
        .with_max_retry_wait(Duration::ZERO)
}

#[allow(dead_code)]
pub fn polecat(server: &MockServer) -> Polecat {
    Polecat::with_config(config(server)).unwrap()
}

/// Serves `documents/page-1.json` for the first request and `documents/page-2.json`
/// for the request continuing after cursor `c1`.
#[allow(dead_code)]
pub async fn mount_document_pages(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(serde_json::json!({ "variables": { "after": "c1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_json("documents/page-2.json")))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_json("documents/page-1.json")))
        .mount(server)
        .await;
}
