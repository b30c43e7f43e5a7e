//! Response parsers
//!
//! Stateless functions converting raw response bodies into typed results.
//! Parsers are tolerant by design: an unparsable body, a missing primary
//! list field or an empty primary list all yield `None` ("nothing to
//! report", not an error), and an item missing a required sub-field is
//! dropped instead of failing the whole parse. The API may hand back
//! partial entries under load; keeping the good items maximizes usable
//! results per call.
//!
//! Cursor fields (`nextPageCursor` / `nextPageToken`, name varies per
//! endpoint family) are extracted independently of the item list.

use crate::api::classify::classify;
use crate::api::request::{
    ENTRY_ATTRIBUTES_HEADER, ENTRY_CREATED_TIME_HEADER, ENTRY_USERIDS_HEADER,
    ENTRY_VERSION_CREATED_TIME_HEADER, ENTRY_VERSION_HEADER,
};
use crate::coordinate::ResourceCoordinate;
use crate::{
    DatastoreInfo, DecodedEntry, EntryKeyInfo, EntryVersionInfo, OrderedEntry, SortedMapItem,
    UserRestriction,
};
use reqwest::header::HeaderMap;
use serde_json::Value;

/// One page of a listing response: decoded items plus the cursor for the
/// next page, when the server issued one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items decoded from this page
    pub items: Vec<T>,
    /// Cursor for the next page; `None` or absent means the listing is done
    pub cursor: Option<String>,
}

fn parse_object(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body).ok()
}

fn extract_cursor(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_str(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse a datastore listing body.
pub fn parse_datastore_list(body: &str) -> Option<Page<DatastoreInfo>> {
    let value = parse_object(body)?;
    let cursor = extract_cursor(&value, "nextPageCursor");
    let raw_items = value.get("datastores")?.as_array()?;
    if raw_items.is_empty() {
        return None;
    }

    let items = raw_items
        .iter()
        .filter_map(|item| {
            Some(DatastoreInfo {
                name: item.get("name")?.as_str()?.to_string(),
                created_time: optional_str(item, "createdTime"),
            })
        })
        .collect();

    Some(Page { items, cursor })
}

/// Parse an entry key listing body.
///
/// The API does not echo the scope back when listing a single scope, so the
/// caller supplies the scope it asked for as a fallback.
pub fn parse_entry_key_list(body: &str, default_scope: &str) -> Option<Page<EntryKeyInfo>> {
    let value = parse_object(body)?;
    let cursor = extract_cursor(&value, "nextPageCursor");
    let raw_items = value.get("keys")?.as_array()?;
    if raw_items.is_empty() {
        return None;
    }

    let items = raw_items
        .iter()
        .filter_map(|item| {
            Some(EntryKeyInfo {
                scope: optional_str(item, "scope")
                    .unwrap_or_else(|| default_scope.to_string()),
                key: item.get("key")?.as_str()?.to_string(),
            })
        })
        .collect();

    Some(Page { items, cursor })
}

/// Parse an entry version listing body.
pub fn parse_version_list(body: &str) -> Option<Page<EntryVersionInfo>> {
    let value = parse_object(body)?;
    let cursor = extract_cursor(&value, "nextPageCursor");
    let raw_items = value.get("versions")?.as_array()?;
    if raw_items.is_empty() {
        return None;
    }

    let items = raw_items
        .iter()
        .filter_map(|item| {
            Some(EntryVersionInfo {
                version: item.get("version")?.as_str()?.to_string(),
                deleted: item.get("deleted").and_then(Value::as_bool).unwrap_or(false),
                content_length: item
                    .get("contentLength")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                created_time: optional_str(item, "createdTime"),
                object_created_time: optional_str(item, "objectCreatedTime"),
            })
        })
        .collect();

    Some(Page { items, cursor })
}

/// Parse an ordered datastore entry listing body.
pub fn parse_ordered_entry_list(body: &str) -> Option<Page<OrderedEntry>> {
    let value = parse_object(body)?;
    let cursor = extract_cursor(&value, "nextPageToken");
    let raw_items = value.get("entries")?.as_array()?;
    if raw_items.is_empty() {
        return None;
    }

    let items = raw_items
        .iter()
        .filter_map(|item| {
            // Values arrive as JSON numbers or numeric strings depending on
            // server version; accept both.
            let value_field = item.get("value")?;
            let stored = value_field
                .as_i64()
                .or_else(|| value_field.as_str().and_then(|s| s.parse::<i64>().ok()))?;
            Some(OrderedEntry {
                id: item.get("id")?.as_str()?.to_string(),
                value: stored,
                path: optional_str(item, "path"),
            })
        })
        .collect();

    Some(Page { items, cursor })
}

/// Parse a sorted map item listing body.
pub fn parse_sorted_map_items(body: &str) -> Option<Page<SortedMapItem>> {
    let value = parse_object(body)?;
    let cursor = extract_cursor(&value, "nextPageCursor");
    let raw_items = value.get("items")?.as_array()?;
    if raw_items.is_empty() {
        return None;
    }

    let items = raw_items
        .iter()
        .filter_map(|item| {
            let sort_key = match item.get("sortKey") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            Some(SortedMapItem {
                id: item.get("id")?.as_str()?.to_string(),
                value: item.get("value")?.to_string(),
                sort_key,
                expire_time: optional_str(item, "expireTime"),
            })
        })
        .collect();

    Some(Page { items, cursor })
}

/// Parse a user restriction (ban list) listing body.
pub fn parse_user_restriction_list(body: &str) -> Option<Page<UserRestriction>> {
    let value = parse_object(body)?;
    let cursor = extract_cursor(&value, "nextPageToken");
    let raw_items = value.get("userRestrictions")?.as_array()?;
    if raw_items.is_empty() {
        return None;
    }

    let items = raw_items
        .iter()
        .filter_map(|item| {
            let restriction = item.get("gameJoinRestriction");
            Some(UserRestriction {
                user: item.get("user")?.as_str()?.to_string(),
                active: restriction
                    .and_then(|r| r.get("active"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                duration: restriction.and_then(|r| optional_str(r, "duration")),
                private_reason: restriction.and_then(|r| optional_str(r, "privateReason")),
                display_reason: restriction.and_then(|r| optional_str(r, "displayReason")),
            })
        })
        .collect();

    Some(Page { items, cursor })
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_user_ids(raw: &str) -> Option<Vec<u64>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let ids: Vec<u64> = value.as_array()?.iter().filter_map(Value::as_u64).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Assemble a decoded entry from an entry detail response.
///
/// The detail endpoint carries metadata in custom headers and the raw value
/// in the body; the coordinate is supplied by the caller because the API
/// does not echo it back.
pub fn entry_from_response(
    coordinate: &ResourceCoordinate,
    headers: &HeaderMap,
    body: &str,
) -> DecodedEntry {
    let (kind, display) = classify(body);
    DecodedEntry {
        coordinate: coordinate.clone(),
        version: header_string(headers, ENTRY_VERSION_HEADER),
        created_time: header_string(headers, ENTRY_CREATED_TIME_HEADER),
        version_created_time: header_string(headers, ENTRY_VERSION_CREATED_TIME_HEADER),
        data_raw: body.to_string(),
        data_display: display,
        kind,
        user_ids: header_string(headers, ENTRY_USERIDS_HEADER)
            .as_deref()
            .and_then(parse_user_ids),
        attributes: header_string(headers, ENTRY_ATTRIBUTES_HEADER),
    }
}
