//! Error types for lookups, downloads and batch execution.
//!
//! Every per-identifier failure is an [`UnpaywallError`]. Variants carry the
//! context that the underlying source errors lack (identifier, URL, path) and
//! are built through the helper constructors below.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Broad classification of an [`UnpaywallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The credential was rejected at client construction.
    InvalidCredential,
    /// Transport error, non-success status, malformed URL or undecodable body.
    Request,
    /// The lookup succeeded but the record has no downloadable location.
    NoOpenAccessCopy,
    /// Writing the document or reserving its filename failed.
    Filesystem,
    /// Invalid batch or transport configuration.
    Configuration,
    /// The single-item operation panicked inside a batch worker.
    Internal,
}

/// Errors produced by the client and the batch coordinator.
#[derive(Debug, Error)]
pub enum UnpaywallError {
    /// The credential is not a valid email address.
    #[error("invalid email address {value:?}")]
    InvalidCredential {
        /// The rejected input.
        value: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The requested URL, with the credential redacted.
        url: String,
        /// The underlying network error, stripped of its URL.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The requested URL, with the credential redacted.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("unsuccessful request {status} {reason} for {url}")]
    HttpStatus {
        /// The requested URL, with the credential redacted.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical status text, empty when the code has none.
        reason: String,
    },

    /// The document URL from a record could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A success response whose body does not match the record shape.
    #[error("malformed lookup response for {identifier}: {source}")]
    Decode {
        /// The identifier that was looked up.
        identifier: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The record has no best open-access location with a PDF URL.
    #[error("no open-access copy available for {identifier}")]
    NoOpenAccessCopy {
        /// The identifier that was looked up.
        identifier: String,
    },

    /// File system error while creating or writing the document.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Every candidate filename was already taken.
    #[error("could not reserve a free filename in {dir} after {attempts} attempts")]
    FilenameExhausted {
        /// The target directory.
        dir: PathBuf,
        /// Number of exclusive-create attempts made.
        attempts: usize,
    },

    /// Worker pool size outside the accepted range.
    #[error("invalid worker count {value}: must be between {min} and {max}")]
    InvalidWorkerCount {
        /// The rejected value.
        value: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// Client settings are outside their accepted ranges.
    #[error("invalid client configuration: {source}")]
    InvalidConfig {
        /// The validation failure.
        #[source]
        source: ConfigError,
    },

    /// No credential was given in the config file or environment.
    #[error("no email configured: set `email` in the config file or UNPAYWALL_EMAIL")]
    MissingCredential,

    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The operation for one identifier panicked.
    #[error("worker panicked while processing {identifier}")]
    WorkerPanicked {
        /// The identifier being processed.
        identifier: String,
    },
}

impl UnpaywallError {
    /// Creates an invalid credential error.
    pub fn invalid_credential(value: impl Into<String>) -> Self {
        Self::InvalidCredential {
            value: value.into(),
        }
    }

    /// Creates a network error, dropping the URL embedded in the reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: source.without_url(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error with the canonical reason phrase.
    pub fn http_status(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a decode error.
    pub fn decode(identifier: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            identifier: identifier.into(),
            source,
        }
    }

    /// Creates a no-open-access-copy error.
    pub fn no_open_access_copy(identifier: impl Into<String>) -> Self {
        Self::NoOpenAccessCopy {
            identifier: identifier.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a filename exhaustion error.
    pub fn filename_exhausted(dir: impl Into<PathBuf>, attempts: usize) -> Self {
        Self::FilenameExhausted {
            dir: dir.into(),
            attempts,
        }
    }

    /// Creates a worker panic error.
    pub fn worker_panicked(identifier: impl Into<String>) -> Self {
        Self::WorkerPanicked {
            identifier: identifier.into(),
        }
    }

    /// Returns the broad category of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidCredential { .. } => FailureKind::InvalidCredential,
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::InvalidUrl { .. }
            | Self::Decode { .. } => FailureKind::Request,
            Self::NoOpenAccessCopy { .. } => FailureKind::NoOpenAccessCopy,
            Self::Io { .. } | Self::FilenameExhausted { .. } => FailureKind::Filesystem,
            Self::InvalidWorkerCount { .. }
            | Self::InvalidConfig { .. }
            | Self::MissingCredential
            | Self::ClientBuild { .. } => FailureKind::Configuration,
            Self::WorkerPanicked { .. } => FailureKind::Internal,
        }
    }

    /// Returns true for transport, status and decode failures.
    #[must_use]
    pub fn is_request_failure(&self) -> bool {
        self.kind() == FailureKind::Request
    }

    /// Returns the HTTP status code for [`UnpaywallError::HttpStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs a URL,
// identifier or path that the source error does not carry.
