//! Concurrent downloads whose titles normalise to the same filename.

use std::collections::HashSet;

use tempfile::TempDir;
use unpaywall_core::BatchCoordinator;

use crate::support::socket_guard::start_mock_server_or_skip;
use crate::support::{mount_lookup, mount_pdf, open_record, test_client, test_client_with_seed};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_same_title_batch_downloads_never_overwrite() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().unwrap();

    // All of these sanitise to "Same_Title".
    let titles = ["Same Title", "Same/Title", "Same:Title", "Same?Title"];
    let mut identifiers = Vec::new();
    for i in 0..12 {
        let doi = format!("10.8/race-{i}");
        let pdf_path = format!("/files/race-{i}.pdf");
        let pdf_url = format!("{}{pdf_path}", server.uri());
        let title = titles[i % titles.len()];
        mount_lookup(&server, &doi, open_record(&doi, Some(title), Some(&pdf_url))).await;
        mount_pdf(&server, &pdf_path, doi.as_bytes()).await;
        identifiers.push(doi);
    }

    let client = test_client(&server);
    let report = BatchCoordinator::new(12)
        .unwrap()
        .download_many(&client, identifiers, temp_dir.path())
        .collect()
        .await;

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    let paths: HashSet<_> = report.successes.iter().map(|s| s.value.clone()).collect();
    assert_eq!(paths.len(), 12, "every download must get its own file");

    for success in &report.successes {
        let body = std::fs::read(&success.value).unwrap();
        assert_eq!(
            body,
            success.identifier.as_bytes(),
            "file {} holds another identifier's body",
            success.value.display()
        );
    }
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_two_clients_with_identical_token_seed_do_not_collide() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().unwrap();

    for doi in ["10.9/left", "10.9/right"] {
        let pdf_path = format!("/files/{}.pdf", doi.replace('/', "-"));
        let pdf_url = format!("{}{pdf_path}", server.uri());
        mount_lookup(&server, doi, open_record(doi, None, Some(&pdf_url))).await;
        mount_pdf(&server, &pdf_path, doi.as_bytes()).await;
    }

    // Same seed: both clients draw the same token sequence for their names.
    let left = test_client_with_seed(&server, 99);
    let right = test_client_with_seed(&server, 99);
    let dir = temp_dir.path().to_path_buf();
    let dir_clone = dir.clone();

    let (a, b) = tokio::join!(
        async move { left.download_one("10.9/left", &dir).await },
        async move { right.download_one("10.9/right", &dir_clone).await },
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a, b);
    assert_eq!(std::fs::read(&a).unwrap(), b"10.9/left");
    assert_eq!(std::fs::read(&b).unwrap(), b"10.9/right");
}
