//! End-to-end import runs against a mock batch service.

use std::sync::atomic::Ordering;

use glucose_bridge_core::{ErrorKind, ImportResult};
use mockito::Matcher;
use tokio_util::sync::CancellationToken;

mod common;
use common::{orchestrator, FixedPermission, MIXED_BATCH};

async fn serve(server: &mut mockito::ServerGuard, status: usize, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/batch.php")
        .match_query(Matcher::UrlEncoded("token".into(), "tok-42".into()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_import_commits_valid_readings() {
    let mut server = mockito::Server::new_async().await;
    let mock = serve(&mut server, 200, MIXED_BATCH).await;
    let (orchestrator, store) = orchestrator(&server.url(), FixedPermission::granted());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    mock.assert_async().await;
    assert_eq!(result, ImportResult::completed(3, 1));
    assert_eq!(result.status_message(), "Imported 1 reading(s), skipped 2 invalid.");

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level_mmol_per_l, 6.1);
    assert_eq!(records[0].time.to_rfc3339(), "2024-01-01T10:00:00+00:00");
}

#[tokio::test]
async fn test_denied_permission_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let permission = FixedPermission::denied();
    let (orchestrator, store) = orchestrator(&server.url(), permission.clone());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    mock.assert_async().await;
    assert_eq!(result.failure_reason(), Some(ErrorKind::PermissionDenied));
    assert_eq!(permission.queries.load(Ordering::SeqCst), 1);
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_error_status_never_reaches_parser() {
    let mut server = mockito::Server::new_async().await;
    // A body the parser would call malformed; the status must win.
    let _mock = serve(&mut server, 503, "<html>down</html>").await;
    let (orchestrator, store) = orchestrator(&server.url(), FixedPermission::granted());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    assert_eq!(result, ImportResult::aborted(0, ErrorKind::RemoteRejected));
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_zero_byte_body_is_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = serve(&mut server, 200, "").await;
    let (orchestrator, _store) = orchestrator(&server.url(), FixedPermission::granted());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    assert_eq!(result.failure_reason(), Some(ErrorKind::EmptyResponse));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let (orchestrator, _store) = orchestrator("http://127.0.0.1:1", FixedPermission::granted());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    assert_eq!(result.failure_reason(), Some(ErrorKind::NetworkError));
    assert_eq!(result.status_message(), ErrorKind::NetworkError.status_message());
}

#[tokio::test]
async fn test_missing_items_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = serve(&mut server, 200, "{}").await;
    let (orchestrator, _store) = orchestrator(&server.url(), FixedPermission::granted());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    assert_eq!(result.failure_reason(), Some(ErrorKind::MalformedPayload));
}

#[tokio::test]
async fn test_all_invalid_batch_is_informational() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{"items":[{"datetime_iso":"bad","value_mmol":5.0},{"datetime_iso":"2024-01-01T10:00:00Z","value_mmol":-3}]}"#;
    let _mock = serve(&mut server, 200, body).await;
    let (orchestrator, store) = orchestrator(&server.url(), FixedPermission::granted());

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    assert_eq!(result, ImportResult::aborted(2, ErrorKind::NothingToImport));
    assert!(result.failure_reason().unwrap().is_informational());
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_store_failure_after_fetch() {
    let mut server = mockito::Server::new_async().await;
    let _mock = serve(&mut server, 200, MIXED_BATCH).await;
    let (orchestrator, store) = orchestrator(&server.url(), FixedPermission::granted());
    store.fail_with(glucose_bridge_core::StoreError::Rejected("invalid record".into()));

    let result = orchestrator
        .run(Some("tok-42"), &CancellationToken::new())
        .await;

    assert_eq!(result, ImportResult::aborted(3, ErrorKind::StoreWriteError));
}

#[tokio::test]
async fn test_launch_link_drives_import() {
    let mut server = mockito::Server::new_async().await;
    let mock = serve(&mut server, 200, MIXED_BATCH).await;
    let (orchestrator, store) = orchestrator(&server.url(), FixedPermission::granted());

    let result = orchestrator
        .run_from_launch_uri(
            Some("glucosebridge://import?token=tok-42"),
            &CancellationToken::new(),
        )
        .await;

    mock.assert_async().await;
    assert!(result.is_success());
    assert_eq!(store.records().len(), 1);
}
