//! Completion barrier: forwards outcomes to the sink and closes it after the last one.

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use super::sink::ResultSink;
use super::streams::BatchOutcome;

enum BarrierState<T> {
    Running {
        remaining: usize,
        succeeded: usize,
        failed: usize,
        sink: Box<dyn ResultSink<T>>,
    },
    Closed,
}

/// Counts outcomes down from the job size and drops the sink at zero.
///
/// The sink is dropped exactly once, right after the final outcome has been
/// forwarded. A barrier for an empty job starts closed.
pub(crate) struct CompletionBarrier<T> {
    state: Mutex<BarrierState<T>>,
}

impl<T> CompletionBarrier<T> {
    pub(crate) fn new(expected: usize, sink: Box<dyn ResultSink<T>>) -> Self {
        let state = if expected == 0 {
            drop(sink);
            info!(succeeded = 0, failed = 0, "batch complete");
            BarrierState::Closed
        } else {
            BarrierState::Running {
                remaining: expected,
                succeeded: 0,
                failed: 0,
                sink,
            }
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Forwards one outcome. Returns true if it was the last one.
    pub(crate) fn deliver(&self, outcome: BatchOutcome<T>) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let BarrierState::Running {
            remaining,
            succeeded,
            failed,
            sink,
        } = &mut *state
        else {
            warn!(identifier = %outcome.identifier(), "outcome delivered after batch closed");
            return false;
        };

        match outcome {
            BatchOutcome::Success(success) => {
                *succeeded += 1;
                sink.accept_success(success);
            }
            BatchOutcome::Failure(failure) => {
                *failed += 1;
                sink.accept_failure(failure);
            }
        }
        *remaining -= 1;

        if *remaining > 0 {
            return false;
        }

        let (succeeded, failed) = (*succeeded, *failed);
        // Dropping the previous state drops the sink, which closes the streams.
        drop(std::mem::replace(&mut *state, BarrierState::Closed));
        info!(succeeded, failed, "batch complete");
        true
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            BarrierState::Closed
        )
    }
}
