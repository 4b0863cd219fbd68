//! Worker pool driving a [`BatchOperation`] over a closed work queue.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::completion::CompletionBarrier;
use super::operation::{BatchOperation, DownloadOperation, LookupOperation};
use super::sink::{ChannelSink, ResultSink};
use super::streams::{BatchFailure, BatchOutcome, BatchStreams, BatchSuccess};
use crate::client::Client;
use crate::config::{BatchConfig, DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS};
use crate::error::UnpaywallError;
use crate::record::LookupRecord;

/// Identifiers submitted together. Order and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchJob {
    identifiers: Vec<String>,
}

impl BatchJob {
    /// Creates a job from any list of identifiers.
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of identifiers, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Returns true if the job has no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Returns the identifiers in submission order.
    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }
}

impl<S: Into<String>> FromIterator<S> for BatchJob {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Worker tasks of a running batch.
///
/// Dropping the handle detaches the workers; the batch still runs to completion.
#[derive(Debug)]
pub struct BatchHandle {
    workers: Vec<JoinHandle<()>>,
}

impl BatchHandle {
    /// Returns the number of spawned workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Waits until every worker has exited.
    pub async fn wait(self) {
        for (worker_id, handle) in self.workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                warn!(worker_id, error = %e, "batch worker ended abnormally");
            }
        }
    }
}

/// Runs batches with a fixed number of concurrent workers.
///
/// # Concurrency Model
///
/// - The work queue is filled with every identifier and closed before any
///   worker starts
/// - Exactly `workers` Tokio tasks are spawned per batch; each pulls one
///   identifier at a time and exits once the queue is empty
/// - Outcomes pass through a completion barrier that closes the result streams
///   after the last one
/// - An error or panic for one identifier becomes that identifier's failure
///   and never stops a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCoordinator {
    workers: usize,
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl BatchCoordinator {
    /// Creates a coordinator with `workers` concurrent workers.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::InvalidWorkerCount`] if `workers` is outside 1..=100.
    ///
    /// # Example
    ///
    /// ```
    /// use unpaywall_core::BatchCoordinator;
    ///
    /// let coordinator = BatchCoordinator::new(8).unwrap();
    /// assert_eq!(coordinator.workers(), 8);
    /// assert!(BatchCoordinator::new(0).is_err());
    /// ```
    #[instrument(level = "debug")]
    pub fn new(workers: usize) -> Result<Self, UnpaywallError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(UnpaywallError::InvalidWorkerCount {
                value: workers,
                min: MIN_WORKERS,
                max: MAX_WORKERS,
            });
        }
        Ok(Self { workers })
    }

    /// Creates a coordinator from the `[batch]` config table.
    ///
    /// # Errors
    ///
    /// Same as [`BatchCoordinator::new`].
    pub fn from_config(config: &BatchConfig) -> Result<Self, UnpaywallError> {
        Self::new(config.workers)
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Looks up every identifier.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn lookup_many<I, S>(&self, client: &Client, identifiers: I) -> BatchStreams<LookupRecord>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(
            Arc::new(LookupOperation::new(client.clone())),
            BatchJob::new(identifiers),
        )
    }

    /// Downloads the best PDF of every identifier into `target_dir`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn download_many<I, S>(
        &self,
        client: &Client,
        identifiers: I,
        target_dir: impl Into<PathBuf>,
    ) -> BatchStreams<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(
            Arc::new(DownloadOperation::new(client.clone(), target_dir)),
            BatchJob::new(identifiers),
        )
    }

    /// Runs `operation` over `job` and returns the result streams.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<O: BatchOperation>(&self, operation: Arc<O>, job: BatchJob) -> BatchStreams<O::Output> {
        let (sink, streams) = ChannelSink::new();
        // Workers run detached; the streams report completion.
        drop(self.run_with_sink(operation, job, sink));
        streams
    }

    /// Runs `operation` over `job`, delivering outcomes to `sink`.
    ///
    /// The sink is dropped right after the last outcome. Must be called from
    /// within a Tokio runtime.
    #[instrument(skip_all, fields(operation = operation.name(), items = job.len(), workers = self.workers))]
    pub fn run_with_sink<O, S>(&self, operation: Arc<O>, job: BatchJob, sink: S) -> BatchHandle
    where
        O: BatchOperation,
        S: ResultSink<O::Output> + 'static,
    {
        let total = job.len();
        info!("starting batch");

        let (queue_tx, queue_rx) = unbounded_channel();
        for identifier in job.identifiers {
            // The receiver is alive, so this cannot fail.
            if queue_tx.send(identifier).is_err() {
                warn!("work queue closed while loading");
            }
        }
        drop(queue_tx);

        let queue = Arc::new(Mutex::new(queue_rx));
        let barrier = Arc::new(CompletionBarrier::new(total, Box::new(sink)));

        let workers = (0..self.workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&operation),
                    Arc::clone(&barrier),
                ))
            })
            .collect();

        BatchHandle { workers }
    }
}

async fn worker_loop<O: BatchOperation>(
    worker_id: usize,
    queue: Arc<Mutex<UnboundedReceiver<String>>>,
    operation: Arc<O>,
    barrier: Arc<CompletionBarrier<O::Output>>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(identifier) = next else {
            debug!(worker_id, "work queue drained");
            return;
        };

        debug!(worker_id, identifier = %identifier, "processing item");
        let outcome = execute_isolated(operation.as_ref(), identifier).await;
        if barrier.deliver(outcome) {
            debug!(worker_id, "delivered final outcome");
        }
    }
}

async fn execute_isolated<O: BatchOperation>(
    operation: &O,
    identifier: String,
) -> BatchOutcome<O::Output> {
    let result = AssertUnwindSafe(operation.execute(&identifier))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(value)) => BatchOutcome::Success(BatchSuccess { identifier, value }),
        Ok(Err(error)) => {
            warn!(
                identifier = %identifier,
                operation = operation.name(),
                error = %error,
                "item failed"
            );
            BatchOutcome::Failure(BatchFailure { identifier, error })
        }
        Err(_panic) => {
            warn!(identifier = %identifier, operation = operation.name(), "item panicked");
            let error = UnpaywallError::worker_panicked(identifier.clone());
            BatchOutcome::Failure(BatchFailure { identifier, error })
        }
    }
}
