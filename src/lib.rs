//! Unpaywall Client Library
//!
//! Looks up open-access records for DOI-like identifiers through the Unpaywall
//! v2 API, downloads the best available PDF, and fans batches of identifiers
//! out to a bounded pool of workers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`client`] - Credential-bearing HTTP client for lookups and downloads
//! - [`batch`] - Worker pool, completion barrier and result streams
//! - [`config`] - Transport and pool settings, TOML file and env overrides
//! - [`record`] - Lookup response types
//! - [`credential`] - Validated, redacting email credential
//! - [`error`] - Error types shared by all of the above

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
mod filename;
pub mod record;
pub mod token;
mod user_agent;

// Re-export commonly used types
pub use batch::{
    BatchCoordinator, BatchFailure, BatchHandle, BatchJob, BatchOperation, BatchOutcome,
    BatchReport, BatchStreams, BatchSuccess, ChannelSink, DownloadOperation, LookupOperation,
    ResultSink,
};
pub use client::Client;
pub use config::{
    BatchConfig, ClientConfig, ConfigError, DEFAULT_WORKERS, FileConfig, MAX_WORKERS, MIN_WORKERS,
};
pub use credential::Credential;
pub use error::{FailureKind, UnpaywallError};
pub use record::{Author, LookupRecord, OaLocation};
pub use token::TokenSource;
