//! End-to-end bulk export: walk datastores, keys and entries into a CSV sink

use opencloud_datastore_client::bulk::BulkExporter;
use opencloud_datastore_client::client::OpenCloudClient;
use opencloud_datastore_client::engine::{RequestEngine, RetryPolicy};
use opencloud_datastore_client::export::csv::CsvEntrySink;
use opencloud_datastore_client::export::EntrySink;
use opencloud_datastore_client::Credentials;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/datastores/v1/universes/12345/standard-datastores";
const KEYS_PATH: &str = "/datastores/v1/universes/12345/standard-datastores/datastore/entries";
const ENTRY_PATH: &str =
    "/datastores/v1/universes/12345/standard-datastores/datastore/entries/entry";

fn client_for(server: &MockServer) -> OpenCloudClient {
    let engine = RequestEngine::with_http_client(reqwest::Client::new(), RetryPolicy::default());
    OpenCloudClient::new(Credentials::new("key-1", false), engine)
        .with_base_url(Url::parse(&server.uri()).unwrap())
}

#[tokio::test]
async fn test_export_universe_to_csv() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"datastores":[{"name":"PlayerData"}]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Key listing across all scopes
    Mock::given(method("GET"))
        .and(path(KEYS_PATH))
        .and(query_param("datastoreName", "PlayerData"))
        .and(query_param("AllScopes", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"keys":[{"scope":"global","key":"user_1"},{"key":"user_2"},{"scope":"global","key":"user_3"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .and(query_param("entryKey", "user_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("roblox-entry-version", "VER.9")
                .set_body_string(r#""hello""#),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Deleted between listing and fetch
    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .and(query_param("entryKey", "user_2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .and(query_param("entryKey", "user_3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("42.5"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("export.csv");

    let mut sink = CsvEntrySink::new(&output).unwrap();
    let report = BulkExporter::new(&client)
        .export_universe(12345, &mut sink)
        .await
        .unwrap();
    sink.close().unwrap();

    assert_eq!(report.datastores, 1);
    assert_eq!(report.entries_exported, 2);
    assert_eq!(report.entries_failed, 0);
    assert!(!report.cancelled);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let records: Vec<_> = reader.records().filter_map(Result::ok).collect();
    assert_eq!(records.len(), 2);

    // String entry: decoded column set
    assert_eq!(records[0].get(3), Some("user_1"));
    assert_eq!(records[0].get(4), Some("VER.9"));
    assert_eq!(records[0].get(5), Some("String"));
    assert_eq!(records[0].get(7), Some("hello"));

    // Number entry: numeric column set
    assert_eq!(records[1].get(3), Some("user_3"));
    assert_eq!(records[1].get(5), Some("Number"));
    assert_eq!(records[1].get(8), Some("42.5"));
}

#[tokio::test]
async fn test_export_skips_failing_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"datastores":[{"name":"DS"}]}"#),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(KEYS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"keys":[{"key":"bad"},{"key":"good"}]}"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .and(query_param("entryKey", "bad"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ENTRY_PATH))
        .and(query_param("entryKey", "good"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("export.csv");

    let mut sink = CsvEntrySink::new(&output).unwrap();
    let report = BulkExporter::new(&client)
        .export_universe(12345, &mut sink)
        .await
        .unwrap();
    sink.close().unwrap();

    // One bad key cannot sink the export
    assert_eq!(report.entries_exported, 1);
    assert_eq!(report.entries_failed, 1);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let records: Vec<_> = reader.records().filter_map(Result::ok).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get(3), Some("good"));
    assert_eq!(records[0].get(5), Some("Bool"));
}

#[tokio::test]
async fn test_export_prefix_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("prefix", "Player"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"datastores":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let temp_dir = TempDir::new().unwrap();
    let mut sink = CsvEntrySink::new(temp_dir.path().join("export.csv")).unwrap();

    let report = BulkExporter::new(&client)
        .with_prefix("Player")
        .export_universe(12345, &mut sink)
        .await
        .unwrap();
    sink.close().unwrap();

    assert_eq!(report.datastores, 0);
    assert_eq!(report.entries_exported, 0);
}
