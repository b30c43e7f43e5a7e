//! Typed operation facade
//!
//! [`OpenCloudClient`] pairs a request builder with a response parser for
//! each endpoint and hands both to the generic engine. The retry/backoff
//! state machine stays entirely endpoint-agnostic; endpoints differ only in
//! the two functions wired here.

use crate::api::request;
use crate::api::response;
use crate::coordinate::ResourceCoordinate;
use crate::engine::{EngineResult, RawResponse, RequestEngine};
use crate::{
    Credentials, DatastoreInfo, DecodedEntry, EntryKeyInfo, EntryVersionInfo, OrderedEntry,
    PagedResult, SortedMapItem, UserRestriction,
};
use url::Url;

/// Client for the Open Cloud datastore API.
///
/// Thin by design: every method builds descriptors through
/// [`crate::api::request`], parses through [`crate::api::response`] and
/// delegates sending, retrying and pagination to the engine.
#[derive(Clone)]
pub struct OpenCloudClient {
    engine: RequestEngine,
    base: Url,
    credentials: Credentials,
}

impl OpenCloudClient {
    /// Create a client against the fixed production API host.
    pub fn new(credentials: Credentials, engine: RequestEngine) -> Self {
        let base = Url::parse(request::DEFAULT_API_HOST)
            .unwrap_or_else(|e| panic!("FATAL: built-in API host is malformed: {e}"));
        Self {
            engine,
            base,
            credentials,
        }
    }

    /// Point the client at a different host (testing, proxies).
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    /// The engine this client sends through.
    pub fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    /// The credentials requests are signed with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// List datastores in a universe, walking pagination to completion or
    /// until `result_limit` items have accumulated.
    pub async fn list_datastores(
        &self,
        universe_id: u64,
        prefix: Option<&str>,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<DatastoreInfo>> {
        self.engine
            .fetch_paged(
                |cursor| {
                    request::list_datastores(&self.base, &self.credentials, universe_id, prefix, cursor)
                },
                response::parse_datastore_list,
                result_limit,
            )
            .await
    }

    /// List entry keys in a datastore.
    ///
    /// `scope: None` lists keys across all scopes.
    pub async fn list_entry_keys(
        &self,
        universe_id: u64,
        datastore: &str,
        scope: Option<&str>,
        prefix: Option<&str>,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<EntryKeyInfo>> {
        let default_scope = scope.unwrap_or(crate::coordinate::DEFAULT_SCOPE).to_string();
        self.engine
            .fetch_paged(
                |cursor| {
                    request::list_entry_keys(
                        &self.base,
                        &self.credentials,
                        universe_id,
                        datastore,
                        scope,
                        prefix,
                        cursor,
                    )
                },
                move |body| response::parse_entry_key_list(body, &default_scope),
                result_limit,
            )
            .await
    }

    /// Fetch one entry. `Ok(None)` means the entry does not exist.
    pub async fn get_entry(
        &self,
        coordinate: &ResourceCoordinate,
    ) -> EngineResult<Option<DecodedEntry>> {
        let descriptor = request::get_entry(&self.base, &self.credentials, coordinate)?;
        let raw = self.engine.send(&descriptor).await?;
        Ok(raw.map(|r| response::entry_from_response(coordinate, &r.headers, &r.body)))
    }

    /// Store an entry value, with optional user-id and attribute metadata.
    ///
    /// Returns the version token the server reports for the new write, when
    /// it reports one.
    pub async fn set_entry(
        &self,
        coordinate: &ResourceCoordinate,
        payload: &str,
        user_ids: Option<&[u64]>,
        attributes: Option<&str>,
    ) -> EngineResult<Option<String>> {
        let descriptor = request::set_entry(
            &self.base,
            &self.credentials,
            coordinate,
            payload,
            user_ids,
            attributes,
        )?;
        let raw = self.engine.send(&descriptor).await?;
        Ok(raw.and_then(|r| extract_version_token(&r)))
    }

    /// Delete one entry. Returns whether the entry existed.
    pub async fn delete_entry(&self, coordinate: &ResourceCoordinate) -> EngineResult<bool> {
        let descriptor = request::delete_entry(&self.base, &self.credentials, coordinate)?;
        Ok(self.engine.send(&descriptor).await?.is_some())
    }

    /// List stored versions of one entry.
    pub async fn list_entry_versions(
        &self,
        coordinate: &ResourceCoordinate,
        sort_order: Option<&str>,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<EntryVersionInfo>> {
        self.engine
            .fetch_paged(
                |cursor| {
                    request::list_entry_versions(
                        &self.base,
                        &self.credentials,
                        coordinate,
                        sort_order,
                        cursor,
                    )
                },
                response::parse_version_list,
                result_limit,
            )
            .await
    }

    /// Fetch one historical version of an entry. `Ok(None)` when either the
    /// entry or the version does not exist.
    pub async fn get_entry_version(
        &self,
        coordinate: &ResourceCoordinate,
        version_id: &str,
    ) -> EngineResult<Option<DecodedEntry>> {
        let descriptor =
            request::get_entry_version(&self.base, &self.credentials, coordinate, version_id)?;
        let raw = self.engine.send(&descriptor).await?;
        Ok(raw.map(|r| response::entry_from_response(coordinate, &r.headers, &r.body)))
    }

    /// List entries of an ordered datastore.
    pub async fn list_ordered_entries(
        &self,
        universe_id: u64,
        datastore: &str,
        scope: &str,
        order_by: Option<&str>,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<OrderedEntry>> {
        self.engine
            .fetch_paged(
                |cursor| {
                    request::list_ordered_entries(
                        &self.base,
                        &self.credentials,
                        universe_id,
                        datastore,
                        scope,
                        order_by,
                        cursor,
                    )
                },
                response::parse_ordered_entry_list,
                result_limit,
            )
            .await
    }

    /// List items of a memory-store sorted map.
    pub async fn list_sorted_map_items(
        &self,
        universe_id: u64,
        map: &str,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<SortedMapItem>> {
        self.engine
            .fetch_paged(
                |cursor| {
                    request::list_sorted_map_items(
                        &self.base,
                        &self.credentials,
                        universe_id,
                        map,
                        cursor,
                    )
                },
                response::parse_sorted_map_items,
                result_limit,
            )
            .await
    }

    /// Publish a message to a messaging-service topic.
    ///
    /// The endpoint acknowledges with an empty body; a missing topic
    /// surfaces as `Ok(false)`.
    pub async fn publish_message(
        &self,
        universe_id: u64,
        topic: &str,
        message: &str,
    ) -> EngineResult<bool> {
        let descriptor =
            request::publish_message(&self.base, &self.credentials, universe_id, topic, message)?;
        Ok(self.engine.send(&descriptor).await?.is_some())
    }

    /// List the universe's user restrictions (ban list).
    pub async fn list_user_restrictions(
        &self,
        universe_id: u64,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<UserRestriction>> {
        self.engine
            .fetch_paged(
                |cursor| {
                    request::list_user_restrictions(&self.base, &self.credentials, universe_id, cursor)
                },
                response::parse_user_restriction_list,
                result_limit,
            )
            .await
    }
}

/// Pull a version token out of a write acknowledgement.
///
/// Newer servers echo `{"version": "..."}` in the body; older ones use the
/// entry version response header. Either may be absent.
fn extract_version_token(raw: &RawResponse) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw.body) {
        if let Some(version) = value.get("version").and_then(|v| v.as_str()) {
            return Some(version.to_string());
        }
    }
    raw.headers
        .get(request::ENTRY_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
