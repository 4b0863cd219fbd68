//! Destinations for batch outcomes.

use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::debug;

use super::streams::{BatchFailure, BatchStreams, BatchSuccess};

/// Receives the outcomes of a batch.
///
/// A sink is owned by the batch's completion barrier and dropped right after
/// the last outcome, so `Drop` marks the end of the batch.
pub trait ResultSink<T>: Send {
    /// Called once per successful identifier.
    fn accept_success(&self, success: BatchSuccess<T>);

    /// Called once per failed identifier.
    fn accept_failure(&self, failure: BatchFailure);
}

/// Sink backed by two unbounded channels; the default for [`BatchStreams`].
#[derive(Debug)]
pub struct ChannelSink<T> {
    successes: UnboundedSender<BatchSuccess<T>>,
    failures: UnboundedSender<BatchFailure>,
}

impl<T> ChannelSink<T> {
    /// Creates a sink and the streams that read from it.
    #[must_use]
    pub fn new() -> (Self, BatchStreams<T>) {
        let (success_tx, success_rx) = unbounded_channel();
        let (failure_tx, failure_rx) = unbounded_channel();
        (
            Self {
                successes: success_tx,
                failures: failure_tx,
            },
            BatchStreams::new(success_rx, failure_rx),
        )
    }
}

impl<T: Send> ResultSink<T> for ChannelSink<T> {
    fn accept_success(&self, success: BatchSuccess<T>) {
        if let Err(unsent) = self.successes.send(success) {
            debug!(identifier = %unsent.0.identifier, "success stream dropped by caller");
        }
    }

    fn accept_failure(&self, failure: BatchFailure) {
        if let Err(unsent) = self.failures.send(failure) {
            debug!(identifier = %unsent.0.identifier, "failure stream dropped by caller");
        }
    }
}
