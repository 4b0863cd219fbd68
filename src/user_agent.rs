//! User-Agent string shared by lookup and document requests.

/// Default User-Agent for every request (identifies the crate and its version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("unpaywall/{version} (open-access-lookup)")
}
