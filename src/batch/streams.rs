//! Outcome types and the two result streams handed back to batch callers.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::UnpaywallError;

/// A successfully processed identifier.
#[derive(Debug)]
pub struct BatchSuccess<T> {
    /// The identifier as submitted.
    pub identifier: String,
    /// The operation's result.
    pub value: T,
}

/// A failed identifier.
#[derive(Debug)]
pub struct BatchFailure {
    /// The identifier as submitted.
    pub identifier: String,
    /// Why it failed.
    pub error: UnpaywallError,
}

/// Result of processing one identifier.
#[derive(Debug)]
pub enum BatchOutcome<T> {
    /// The operation returned a value.
    Success(BatchSuccess<T>),
    /// The operation returned an error or panicked.
    Failure(BatchFailure),
}

impl<T> BatchOutcome<T> {
    /// Returns the identifier this outcome belongs to.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Success(success) => &success.identifier,
            Self::Failure(failure) => &failure.identifier,
        }
    }

    /// Returns true for [`BatchOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Every outcome of a finished batch, split by kind.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Successful identifiers.
    pub successes: Vec<BatchSuccess<T>>,
    /// Failed identifiers.
    pub failures: Vec<BatchFailure>,
}

impl<T> BatchReport<T> {
    /// Returns the number of outcomes, which equals the number of submitted identifiers.
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Receiving side of a batch: one stream of successes, one of failures.
///
/// Both streams close once every identifier has produced an outcome. They are
/// unbounded, so draining either one alone never blocks the workers.
#[derive(Debug)]
pub struct BatchStreams<T> {
    successes: UnboundedReceiver<BatchSuccess<T>>,
    failures: UnboundedReceiver<BatchFailure>,
    successes_open: bool,
    failures_open: bool,
}

enum Received<T> {
    Success(Option<BatchSuccess<T>>),
    Failure(Option<BatchFailure>),
}

impl<T> BatchStreams<T> {
    pub(crate) fn new(
        successes: UnboundedReceiver<BatchSuccess<T>>,
        failures: UnboundedReceiver<BatchFailure>,
    ) -> Self {
        Self {
            successes,
            failures,
            successes_open: true,
            failures_open: true,
        }
    }

    /// Waits for the next outcome from either stream.
    ///
    /// Returns `None` once both streams are closed.
    pub async fn next(&mut self) -> Option<BatchOutcome<T>> {
        loop {
            if !self.successes_open && !self.failures_open {
                return None;
            }

            let Self {
                successes,
                failures,
                successes_open,
                failures_open,
            } = self;

            let received = tokio::select! {
                item = successes.recv(), if *successes_open => Received::Success(item),
                item = failures.recv(), if *failures_open => Received::Failure(item),
            };

            match received {
                Received::Success(Some(success)) => return Some(BatchOutcome::Success(success)),
                Received::Failure(Some(failure)) => return Some(BatchOutcome::Failure(failure)),
                Received::Success(None) => *successes_open = false,
                Received::Failure(None) => *failures_open = false,
            }
        }
    }

    /// Drains both streams to completion.
    pub async fn collect(mut self) -> BatchReport<T> {
        let mut report = BatchReport::default();
        while let Some(outcome) = self.next().await {
            match outcome {
                BatchOutcome::Success(success) => report.successes.push(success),
                BatchOutcome::Failure(failure) => report.failures.push(failure),
            }
        }
        report
    }

    /// Splits into the raw success and failure receivers.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        UnboundedReceiver<BatchSuccess<T>>,
        UnboundedReceiver<BatchFailure>,
    ) {
        (self.successes, self.failures)
    }
}
