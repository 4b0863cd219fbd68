//! Single-item operations run by batch workers.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::client::Client;
use crate::error::UnpaywallError;
use crate::record::LookupRecord;

/// The work a batch performs for one identifier.
///
/// Implementations must be safe to call from several workers at once.
#[async_trait]
pub trait BatchOperation: Send + Sync + 'static {
    /// Value produced for a successful identifier.
    type Output: Send + 'static;

    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Processes one identifier.
    async fn execute(&self, identifier: &str) -> Result<Self::Output, UnpaywallError>;
}

/// Looks up each identifier's record.
#[derive(Debug, Clone)]
pub struct LookupOperation {
    client: Client,
}

impl LookupOperation {
    /// Creates the operation over a shared client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BatchOperation for LookupOperation {
    type Output = LookupRecord;

    fn name(&self) -> &'static str {
        "lookup"
    }

    async fn execute(&self, identifier: &str) -> Result<LookupRecord, UnpaywallError> {
        self.client.lookup(identifier).await
    }
}

/// Downloads each identifier's best PDF into one directory.
#[derive(Debug, Clone)]
pub struct DownloadOperation {
    client: Client,
    target_dir: PathBuf,
}

impl DownloadOperation {
    /// Creates the operation over a shared client and a fixed target directory.
    #[must_use]
    pub fn new(client: Client, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            target_dir: target_dir.into(),
        }
    }

    /// Returns the directory documents are written to.
    #[must_use]
    pub fn target_dir(&self) -> &std::path::Path {
        &self.target_dir
    }
}

#[async_trait]
impl BatchOperation for DownloadOperation {
    type Output = PathBuf;

    fn name(&self) -> &'static str {
        "download"
    }

    async fn execute(&self, identifier: &str) -> Result<PathBuf, UnpaywallError> {
        self.client.download_one(identifier, &self.target_dir).await
    }
}
