//! Integration tests for the transport log, server clock and cancellation

use opencloud_datastore_client::client::OpenCloudClient;
use opencloud_datastore_client::engine::{EngineError, RequestEngine, RetryPolicy};
use opencloud_datastore_client::shutdown::ShutdownCoordinator;
use opencloud_datastore_client::Credentials;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/datastores/v1/universes/12345/standard-datastores";

fn engine() -> RequestEngine {
    RequestEngine::with_http_client(reqwest::Client::new(), RetryPolicy::default())
}

fn client_with(engine: RequestEngine, server: &MockServer) -> OpenCloudClient {
    OpenCloudClient::new(Credentials::new("key-1", false), engine)
        .with_base_url(Url::parse(&server.uri()).unwrap())
}

#[tokio::test]
async fn test_transport_log_records_every_send_pre_send() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine();
    let log = engine.transport_log();
    let client = client_with(engine, &server);

    // Even a request that fails terminally is recorded.
    let error = client.list_datastores(12345, None, None).await.unwrap_err();
    assert!(matches!(error, EngineError::Fatal { status: 500, .. }));

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, "GET");
    assert!(entries[0].url.contains(LIST_PATH));
    assert!(entries[0].url.contains("limit=50"));

    log.clear();
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_transport_log_reads_newest_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"datastores":[{"name":"A"}],"nextPageCursor":"next"}"#,
        ))
        .mount(&server)
        .await;

    let engine = engine();
    let log = engine.transport_log();
    let client = client_with(engine, &server);

    // Two pages -> two log entries; the cursor-bearing send is newest.
    let listing = client.list_datastores(12345, None, Some(1)).await.unwrap();
    assert_eq!(listing.len(), 1);

    let second = client.list_datastores(12345, None, Some(1)).await.unwrap();
    assert_eq!(second.len(), 1);

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].timestamp >= entries[1].timestamp);
}

#[tokio::test]
async fn test_server_clock_updates_on_success_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"datastores":[{"name":"A"}]}"#))
        .mount(&server)
        .await;

    let engine = engine();
    let clock = engine.server_clock();
    assert!(clock.estimate_now().is_none());

    let client = client_with(engine, &server);
    client.list_datastores(12345, None, None).await.unwrap();

    // The mock server stamps a Date header on every response.
    let estimate = clock.estimate_now();
    assert!(estimate.is_some());
    assert!(clock.last_observed().is_some());
}

#[tokio::test]
async fn test_cancelled_request_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"datastores":[]}"#))
        .mount(&server)
        .await;

    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let engine = engine().with_shutdown(shutdown);
    let log = engine.transport_log();
    let client = client_with(engine, &server);

    let error = client.list_datastores(12345, None, None).await.unwrap_err();
    assert!(matches!(error, EngineError::Cancelled));

    // Cancellation is checked before the send, so nothing is recorded.
    assert!(log.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_backoff_sleep() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let shutdown = ShutdownCoordinator::shared();
    let engine = engine().with_shutdown(shutdown.clone());
    let client = client_with(engine, &server);

    let request = tokio::spawn(async move { client.list_datastores(12345, None, None).await });

    // Let the first send and the 429 land, then cancel during the backoff.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    shutdown.request_shutdown();

    let error = request.await.unwrap().unwrap_err();
    assert!(matches!(error, EngineError::Cancelled));
}
