//! Integration tests for cursor pagination against a mock server

use opencloud_datastore_client::client::OpenCloudClient;
use opencloud_datastore_client::engine::{RequestEngine, RetryPolicy};
use opencloud_datastore_client::Credentials;
use url::Url;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenCloudClient {
    let engine = RequestEngine::with_http_client(reqwest::Client::new(), RetryPolicy::default());
    OpenCloudClient::new(Credentials::new("key-1", false), engine)
        .with_base_url(Url::parse(&server.uri()).unwrap())
}

const LIST_PATH: &str = "/datastores/v1/universes/12345/standard-datastores";

#[tokio::test]
async fn test_datastore_list_walks_cursor_to_completion() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"datastores":[{"name":"A"},{"name":"B"}],"nextPageCursor":"abc"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("cursor", "abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"datastores":[{"name":"C"}]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listing = client.list_datastores(12345, None, None).await.unwrap();

    let names: Vec<&str> = listing.items.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(listing.cursor.is_none());

    // Exactly two requests; the second carries the first page's cursor.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].url.query().unwrap().contains("cursor=abc"));
    assert!(requests[1].url.query().unwrap().contains("limit=50"));
}

#[tokio::test]
async fn test_pagination_terminates_on_cursorless_page() {
    let server = MockServer::start().await;

    // A single page with no cursor ends the walk after exactly one send.
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"datastores":[{"name":"Only"}]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listing = client.list_datastores(12345, None, None).await.unwrap();
    assert_eq!(listing.len(), 1);
}

#[tokio::test]
async fn test_empty_page_with_cursor_does_not_loop() {
    let server = MockServer::start().await;

    // Zero new items terminates the walk even though a cursor is present.
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"datastores":[],"nextPageCursor":"keep-going"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listing = client.list_datastores(12345, None, None).await.unwrap();
    assert!(listing.is_empty());
}

#[tokio::test]
async fn test_result_limit_is_a_soft_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"datastores":[{"name":"A"},{"name":"B"}],"nextPageCursor":"abc"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    // Limit of 1 stops after the first page but keeps the whole page.
    let listing = client.list_datastores(12345, None, Some(1)).await.unwrap();
    assert_eq!(listing.len(), 2);
    // The cursor of the last received page is preserved.
    assert_eq!(listing.cursor.as_deref(), Some("abc"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_list_on_missing_universe_is_empty_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("NOT FOUND"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listing = client.list_datastores(12345, None, None).await.unwrap();
    assert!(listing.is_empty());
    assert!(listing.cursor.is_none());
}

#[tokio::test]
async fn test_malformed_page_body_completes_with_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listing = client.list_datastores(12345, None, None).await.unwrap();
    assert!(listing.is_empty());
}
