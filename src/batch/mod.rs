//! Bounded-concurrency batch execution over a list of identifiers.
//!
//! A [`BatchCoordinator`] pre-loads every identifier of a [`BatchJob`] into a
//! closed work queue and drives a fixed number of workers over it. Each worker
//! pulls one identifier, runs the single-item [`BatchOperation`] and hands the
//! outcome to a completion barrier, which forwards it to a [`ResultSink`] and
//! closes the sink after the last outcome.
//!
//! # Features
//!
//! - Fixed pool of 1 to 100 workers (5 by default)
//! - Separate, unbounded success and failure streams
//! - Per-item failure isolation, panics included
//! - No ordering guarantee between outcomes
//!
//! # Example
//!
//! ```no_run
//! use unpaywall_core::{BatchCoordinator, Client};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("you@example.org")?;
//! let coordinator = BatchCoordinator::new(5)?;
//! let report = coordinator
//!     .lookup_many(&client, ["10.1038/nature12373", "10.1000/closed"])
//!     .collect()
//!     .await;
//! println!("ok: {}, failed: {}", report.successes.len(), report.failures.len());
//! # Ok(())
//! # }
//! ```

mod completion;
mod coordinator;
mod operation;
mod sink;
mod streams;

pub use coordinator::{BatchCoordinator, BatchHandle, BatchJob};
pub use operation::{BatchOperation, DownloadOperation, LookupOperation};
pub use sink::{ChannelSink, ResultSink};
pub use streams::{BatchFailure, BatchOutcome, BatchReport, BatchStreams, BatchSuccess};
