//! Integration tests for entry detail, write and delete operations

use opencloud_datastore_client::client::OpenCloudClient;
use opencloud_datastore_client::engine::{RequestEngine, RetryPolicy};
use opencloud_datastore_client::{Credentials, EntryKind, ResourceCoordinate};
use url::Url;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENTRY_PATH: &str =
    "/datastores/v1/universes/12345/standard-datastores/datastore/entries/entry";

fn client_for(server: &MockServer) -> OpenCloudClient {
    let engine = RequestEngine::with_http_client(reqwest::Client::new(), RetryPolicy::default());
    OpenCloudClient::new(Credentials::new("key-1", false), engine)
        .with_base_url(Url::parse(&server.uri()).unwrap())
}

fn coordinate() -> ResourceCoordinate {
    ResourceCoordinate::new(12345, "PlayerData", "", "user_1").unwrap()
}

#[tokio::test]
async fn test_get_entry_decodes_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .and(query_param("datastoreName", "PlayerData"))
        .and(query_param("scope", "global"))
        .and(query_param("entryKey", "user_1"))
        .and(header("x-api-key", "key-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("roblox-entry-version", "VER.1")
                .insert_header("roblox-entry-userids", "[101,102]")
                .insert_header("roblox-entry-attributes", "{\"vip\":true}")
                .set_body_string(r#"{"coins":10,"items":["sword"]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let entry = client.get_entry(&coordinate()).await.unwrap().unwrap();

    assert_eq!(entry.kind, EntryKind::Json);
    assert_eq!(entry.version.as_deref(), Some("VER.1"));
    assert_eq!(entry.user_ids.as_deref(), Some(&[101, 102][..]));
    assert_eq!(entry.attributes.as_deref(), Some("{\"vip\":true}"));
    assert_eq!(entry.data_raw, r#"{"coins":10,"items":["sword"]}"#);
    assert_eq!(entry.coordinate, coordinate());
}

#[tokio::test]
async fn test_get_entry_string_payload_is_unwrapped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#""hello player""#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let entry = client.get_entry(&coordinate()).await.unwrap().unwrap();

    assert_eq!(entry.kind, EntryKind::String);
    assert_eq!(entry.data_display, "hello player");
    assert_eq!(entry.data_raw, r#""hello player""#);
}

#[tokio::test]
async fn test_get_entry_404_is_absent_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("NOT FOUND"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let entry = client.get_entry(&coordinate()).await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_set_entry_sends_integrity_header_and_exact_body() {
    let server = MockServer::start().await;

    // base64(md5("hello world"))
    Mock::given(method("POST"))
        .and(path(ENTRY_PATH))
        .and(header("content-md5", "XrY7u+Ae7tCTyyK7j1rNww=="))
        .and(header("content-type", "application/json"))
        .and(header("roblox-entry-userids", "[7,8]"))
        .and(body_string("hello world"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"version":"VER.2"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let version = client
        .set_entry(&coordinate(), "hello world", Some(&[7, 8]), None)
        .await
        .unwrap();
    assert_eq!(version.as_deref(), Some("VER.2"));
}

#[tokio::test]
async fn test_delete_entry_reports_absence() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(ENTRY_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(!client.delete_entry(&coordinate()).await.unwrap());
}

#[tokio::test]
async fn test_publish_message_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messaging-service/v1/universes/12345/topics/events"))
        .and(body_string(r#"{"message":"deploy"}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.publish_message(12345, "events", "deploy").await.unwrap());
}
