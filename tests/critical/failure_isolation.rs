//! One item's error or panic never affects its siblings.

use std::sync::Arc;

use async_trait::async_trait;
use unpaywall_core::{BatchCoordinator, BatchJob, BatchOperation, FailureKind, UnpaywallError};

/// Panics for `boom`, fails for `fail`, succeeds otherwise.
struct VolatileOperation;

#[async_trait]
impl BatchOperation for VolatileOperation {
    type Output = String;

    fn name(&self) -> &'static str {
        "volatile"
    }

    async fn execute(&self, identifier: &str) -> Result<String, UnpaywallError> {
        tokio::task::yield_now().await;
        match identifier {
            "boom" => panic!("operation blew up on {identifier}"),
            "fail" => Err(UnpaywallError::no_open_access_copy(identifier)),
            other => Ok(other.to_uppercase()),
        }
    }
}

#[tokio::test]
async fn p0_panicking_item_becomes_single_failure() {
    let report = BatchCoordinator::new(3)
        .unwrap()
        .run(
            Arc::new(VolatileOperation),
            BatchJob::new(["a", "boom", "b", "c"]),
        )
        .collect()
        .await;

    assert_eq!(report.total(), 4);
    assert_eq!(report.successes.len(), 3);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.identifier, "boom");
    assert_eq!(failure.error.kind(), FailureKind::Internal);
    assert!(matches!(failure.error, UnpaywallError::WorkerPanicked { .. }));
}

#[tokio::test]
async fn p0_single_worker_survives_panics_and_errors() {
    let report = BatchCoordinator::new(1)
        .unwrap()
        .run(
            Arc::new(VolatileOperation),
            BatchJob::new(["boom", "x", "fail", "boom", "y"]),
        )
        .collect()
        .await;

    assert_eq!(report.total(), 5);
    let mut values: Vec<&str> = report.successes.iter().map(|s| s.value.as_str()).collect();
    values.sort_unstable();
    assert_eq!(values, ["X", "Y"]);

    let panicked = report
        .failures
        .iter()
        .filter(|f| f.error.kind() == FailureKind::Internal)
        .count();
    let no_copy = report
        .failures
        .iter()
        .filter(|f| f.error.kind() == FailureKind::NoOpenAccessCopy)
        .count();
    assert_eq!((panicked, no_copy), (2, 1));
}
