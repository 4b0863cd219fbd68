//! The raw credential never appears in error messages or emitted tracing data.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use unpaywall_core::BatchCoordinator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::socket_guard::start_mock_server_or_skip;
use crate::support::{TEST_EMAIL, api_path, mount_lookup, open_record, test_client};

const ENCODED_EMAIL: &str = "researcher%40example.org";

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Captures fields of every event and every new span.
#[derive(Clone, Default)]
struct CaptureLayer {
    records: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        self.records.lock().unwrap().push(visitor.fields);
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.records.lock().unwrap().push(visitor.fields);
    }
}

fn assert_no_credential(text: &str) {
    assert!(!text.contains(TEST_EMAIL), "raw credential exposed: {text}");
    assert!(!text.contains(ENCODED_EMAIL), "encoded credential exposed: {text}");
}

#[tokio::test]
async fn p0_errors_and_logs_do_not_contain_credential() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().unwrap();

    mount_lookup(&server, "10.10/open", open_record("10.10/open", Some("Open"), None)).await;
    Mock::given(method("GET"))
        .and(path(api_path("10.10/missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("10.10/broken")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let layer = CaptureLayer::default();
    let records = Arc::clone(&layer.records);
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();

    let client = test_client(&server);
    let mut messages = Vec::new();

    let lookups = BatchCoordinator::new(2)
        .unwrap()
        .lookup_many(&client, ["10.10/open", "10.10/missing", "10.10/broken"])
        .collect()
        .await;
    assert_eq!(lookups.failures.len(), 2);
    for failure in &lookups.failures {
        messages.push(failure.error.to_string());
        messages.push(format!("{:?}", failure.error));
    }

    let downloads = BatchCoordinator::new(2)
        .unwrap()
        .download_many(&client, ["10.10/open", "10.10/missing"], temp_dir.path())
        .collect()
        .await;
    assert_eq!(downloads.failures.len(), 2);
    for failure in &downloads.failures {
        messages.push(failure.error.to_string());
        messages.push(format!("{:?}", failure.error));
    }

    messages.push(format!("{client:?}"));
    for message in &messages {
        assert_no_credential(message);
    }

    let records = records.lock().unwrap();
    assert!(!records.is_empty(), "expected tracing output to inspect");
    for record in records.iter() {
        for (field, value) in record {
            assert_no_credential(&format!("{field}={value}"));
        }
    }
}

#[tokio::test]
async fn p1_unreachable_host_error_omits_credential() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let config = unpaywall_core::ClientConfig {
        connect_timeout_secs: 2,
        read_timeout_secs: 2,
        ..unpaywall_core::ClientConfig::with_base_url("http://127.0.0.1:9/v2")
    };
    let client = unpaywall_core::Client::with_config(TEST_EMAIL, &config).unwrap();

    let err = client.lookup("10.10/unreachable").await.unwrap_err();
    assert!(err.is_request_failure(), "unexpected error: {err:?}");
    assert_no_credential(&err.to_string());
    assert_no_credential(&format!("{err:?}"));
}
