//! Skips tests that need a localhost socket on hosts that forbid binding one.
//!
//! Set `UNPAYWALL_REQUIRE_SOCKET_TESTS=1` in CI so a missing socket fails the
//! run instead of silently skipping.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_VAR: &str = "UNPAYWALL_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_VAR)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Returns true when the caller should return early without running.
#[track_caller]
#[must_use]
pub fn localhost_unavailable() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let caller = Location::caller();
    let reason = format!(
        "no localhost socket for mock HTTP test at {}:{}",
        caller.file(),
        caller.line()
    );
    assert!(!sockets_required(), "{reason} ({REQUIRE_VAR} is set)");

    eprintln!("skipping: {reason}");
    true
}

/// Starts a mock API server, or returns `None` when sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if localhost_unavailable() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
