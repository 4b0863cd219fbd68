//! Shared helpers for integration tests: socket guard, record fixtures, mock mounting.

#![allow(dead_code)]

pub mod socket_guard;

use std::time::Duration;

use serde_json::{Value, json};
use unpaywall_core::{Client, ClientConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Credential used by every test client.
pub const TEST_EMAIL: &str = "researcher@example.org";

/// Path of the lookup endpoint for `identifier` on the mock server.
pub fn api_path(identifier: &str) -> String {
    format!("/v2/{}", urlencoding::encode(identifier))
}

/// Builds a client pointed at the mock server's `/v2` base with a fixed token seed.
pub fn test_client(server: &MockServer) -> Client {
    test_client_with_seed(server, 7)
}

pub fn test_client_with_seed(server: &MockServer, seed: u64) -> Client {
    let config = ClientConfig {
        token_seed: Some(seed),
        ..ClientConfig::with_base_url(format!("{}/v2", server.uri()))
    };
    Client::with_config(TEST_EMAIL, &config).expect("test client")
}

/// Record JSON with a best location pointing at `pdf_url`.
pub fn open_record(doi: &str, title: Option<&str>, pdf_url: Option<&str>) -> Value {
    json!({
        "doi": doi,
        "doi_url": format!("https://doi.org/{doi}"),
        "title": title,
        "genre": "journal-article",
        "is_oa": pdf_url.is_some(),
        "best_oa_location": pdf_url.map(|url| json!({
            "evidence": "open (via page says license)",
            "host_type": "publisher",
            "is_best": true,
            "license": "cc-by",
            "url": url,
            "url_for_pdf": url,
            "version": "publishedVersion"
        })),
        "oa_locations": [],
        "journal_name": "Journal of Tests",
        "year": 2020
    })
}

/// Mounts a lookup response for `doi`.
pub async fn mount_lookup(server: &MockServer, doi: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(api_path(doi)))
        .and(query_param("email", TEST_EMAIL))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a lookup response for `doi` that arrives after `delay`.
pub async fn mount_slow_lookup(server: &MockServer, doi: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(api_path(doi)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(open_record(doi, Some("Slow"), None))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mounts a PDF body at `pdf_path`.
pub async fn mount_pdf(server: &MockServer, pdf_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(pdf_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}
