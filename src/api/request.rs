//! Request builders
//!
//! Pure functions mapping (credentials, resource coordinates, cursor) to
//! fully-formed, immutable request descriptors. Every user-supplied query
//! value is percent-encoded by the `url` crate; page sizes are fixed per
//! endpoint family. Builders never touch global state and never do I/O.

use crate::api::{ApiError, ApiResult};
use crate::coordinate::{ResourceCoordinate, DEFAULT_SCOPE};
use crate::Credentials;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use md5::{Digest, Md5};
use reqwest::Method;
use url::Url;

/// Fixed API host all requests target.
pub const DEFAULT_API_HOST: &str = "https://apis.roblox.com";

/// Auth header present on every request.
pub const AUTH_HEADER: &str = "x-api-key";

/// Integrity header carrying the base64 MD5 digest of a POST body.
pub const CONTENT_MD5_HEADER: &str = "content-md5";

/// Response/request header carrying the entry version token.
pub const ENTRY_VERSION_HEADER: &str = "roblox-entry-version";

/// Header carrying the associated user-id list as a JSON array.
pub const ENTRY_USERIDS_HEADER: &str = "roblox-entry-userids";

/// Header carrying the attributes blob as a JSON object.
pub const ENTRY_ATTRIBUTES_HEADER: &str = "roblox-entry-attributes";

/// Response header carrying the entry creation time.
pub const ENTRY_CREATED_TIME_HEADER: &str = "roblox-entry-created-time";

/// Response header carrying the version creation time.
pub const ENTRY_VERSION_CREATED_TIME_HEADER: &str = "roblox-entry-version-created-time";

/// Page size for datastore listing.
pub const DATASTORE_PAGE_LIMIT: usize = 50;
/// Page size for entry key listing.
pub const ENTRY_PAGE_LIMIT: usize = 100;
/// Page size for entry version listing.
pub const VERSION_PAGE_LIMIT: usize = 100;
/// Page size for ordered datastore entry listing.
pub const ORDERED_PAGE_LIMIT: usize = 100;
/// Page size for sorted map item listing.
pub const SORTED_MAP_PAGE_LIMIT: usize = 100;
/// Page size for user restriction listing.
pub const RESTRICTION_PAGE_LIMIT: usize = 50;

/// An immutable, fully-formed HTTP request: method, pre-encoded URL, headers
/// and optional body.
///
/// Retries resend the same descriptor verbatim; nothing mutates it after
/// construction.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Fully qualified URL with query parameters already encoded
    pub url: Url,
    /// Header name/value pairs, auth always included
    pub headers: Vec<(&'static str, String)>,
    /// Request body, POST endpoints only
    pub body: Option<String>,
}

/// Base64-encoded MD5 digest over the exact bytes of a request body.
fn content_md5(body: &str) -> String {
    BASE64.encode(Md5::digest(body.as_bytes()))
}

/// Extend the base URL with literal path segments (segments are encoded).
fn endpoint_url(base: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("base URL cannot be a base".to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn auth_headers(credentials: &Credentials) -> Vec<(&'static str, String)> {
    vec![(AUTH_HEADER, credentials.api_key().to_string())]
}

fn require_name(value: &str, what: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest(format!("{what} cannot be empty")));
    }
    Ok(())
}

fn push_cursor(url: &mut Url, name: &str, cursor: Option<&str>) {
    if let Some(cursor) = cursor {
        if !cursor.is_empty() {
            url.query_pairs_mut().append_pair(name, cursor);
        }
    }
}

/// Build a datastore listing request.
pub fn list_datastores(
    base: &Url,
    credentials: &Credentials,
    universe_id: u64,
    prefix: Option<&str>,
    cursor: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    let universe = universe_id.to_string();
    let mut url = endpoint_url(
        base,
        &["datastores", "v1", "universes", &universe, "standard-datastores"],
    )?;
    url.query_pairs_mut()
        .append_pair("limit", &DATASTORE_PAGE_LIMIT.to_string());
    if let Some(prefix) = prefix {
        if !prefix.is_empty() {
            url.query_pairs_mut().append_pair("prefix", prefix);
        }
    }
    push_cursor(&mut url, "cursor", cursor);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build an entry key listing request.
///
/// `scope: None` (or empty) requests keys across every scope via
/// `AllScopes=true`; a concrete scope filters to that scope only.
pub fn list_entry_keys(
    base: &Url,
    credentials: &Credentials,
    universe_id: u64,
    datastore: &str,
    scope: Option<&str>,
    prefix: Option<&str>,
    cursor: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    require_name(datastore, "datastore name")?;
    let universe = universe_id.to_string();
    let mut url = endpoint_url(
        base,
        &[
            "datastores",
            "v1",
            "universes",
            &universe,
            "standard-datastores",
            "datastore",
            "entries",
        ],
    )?;
    url.query_pairs_mut().append_pair("datastoreName", datastore);
    match scope {
        Some(scope) if !scope.trim().is_empty() => {
            url.query_pairs_mut().append_pair("scope", scope);
        }
        _ => {
            url.query_pairs_mut().append_pair("AllScopes", "true");
        }
    }
    if let Some(prefix) = prefix {
        if !prefix.is_empty() {
            url.query_pairs_mut().append_pair("prefix", prefix);
        }
    }
    url.query_pairs_mut()
        .append_pair("limit", &ENTRY_PAGE_LIMIT.to_string());
    push_cursor(&mut url, "cursor", cursor);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}

fn entry_detail_url(base: &Url, coordinate: &ResourceCoordinate) -> ApiResult<Url> {
    let universe = coordinate.universe_id().to_string();
    let mut url = endpoint_url(
        base,
        &[
            "datastores",
            "v1",
            "universes",
            &universe,
            "standard-datastores",
            "datastore",
            "entries",
            "entry",
        ],
    )?;
    url.query_pairs_mut()
        .append_pair("datastoreName", coordinate.datastore())
        .append_pair("scope", coordinate.scope())
        .append_pair("entryKey", coordinate.key());
    Ok(url)
}

/// Build an entry detail GET request.
pub fn get_entry(
    base: &Url,
    credentials: &Credentials,
    coordinate: &ResourceCoordinate,
) -> ApiResult<RequestDescriptor> {
    Ok(RequestDescriptor {
        method: Method::GET,
        url: entry_detail_url(base, coordinate)?,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build an entry set (POST) request.
///
/// The body is sent exactly as given; the integrity header is the base64
/// MD5 digest of those bytes. Metadata headers are only attached when the
/// corresponding value is present and non-empty.
pub fn set_entry(
    base: &Url,
    credentials: &Credentials,
    coordinate: &ResourceCoordinate,
    payload: &str,
    user_ids: Option<&[u64]>,
    attributes: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    let mut headers = auth_headers(credentials);
    headers.push(("content-type", "application/json".to_string()));
    headers.push((CONTENT_MD5_HEADER, content_md5(payload)));
    if let Some(ids) = user_ids {
        if !ids.is_empty() {
            let rendered = serde_json::to_string(ids)
                .map_err(|e| ApiError::InvalidRequest(format!("user ids not serializable: {e}")))?;
            headers.push((ENTRY_USERIDS_HEADER, rendered));
        }
    }
    if let Some(attributes) = attributes {
        if !attributes.trim().is_empty() {
            headers.push((ENTRY_ATTRIBUTES_HEADER, attributes.to_string()));
        }
    }

    Ok(RequestDescriptor {
        method: Method::POST,
        url: entry_detail_url(base, coordinate)?,
        headers,
        body: Some(payload.to_string()),
    })
}

/// Build an entry delete request.
pub fn delete_entry(
    base: &Url,
    credentials: &Credentials,
    coordinate: &ResourceCoordinate,
) -> ApiResult<RequestDescriptor> {
    Ok(RequestDescriptor {
        method: Method::DELETE,
        url: entry_detail_url(base, coordinate)?,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build an entry version listing request.
pub fn list_entry_versions(
    base: &Url,
    credentials: &Credentials,
    coordinate: &ResourceCoordinate,
    sort_order: Option<&str>,
    cursor: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    let universe = coordinate.universe_id().to_string();
    let mut url = endpoint_url(
        base,
        &[
            "datastores",
            "v1",
            "universes",
            &universe,
            "standard-datastores",
            "datastore",
            "entries",
            "entry",
            "versions",
        ],
    )?;
    url.query_pairs_mut()
        .append_pair("datastoreName", coordinate.datastore())
        .append_pair("scope", coordinate.scope())
        .append_pair("entryKey", coordinate.key())
        .append_pair("limit", &VERSION_PAGE_LIMIT.to_string());
    if let Some(order) = sort_order {
        if !order.is_empty() {
            url.query_pairs_mut().append_pair("sortOrder", order);
        }
    }
    push_cursor(&mut url, "cursor", cursor);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build a request for one specific entry version.
pub fn get_entry_version(
    base: &Url,
    credentials: &Credentials,
    coordinate: &ResourceCoordinate,
    version_id: &str,
) -> ApiResult<RequestDescriptor> {
    require_name(version_id, "version id")?;
    let universe = coordinate.universe_id().to_string();
    let mut url = endpoint_url(
        base,
        &[
            "datastores",
            "v1",
            "universes",
            &universe,
            "standard-datastores",
            "datastore",
            "entries",
            "entry",
            "versions",
            "version",
        ],
    )?;
    url.query_pairs_mut()
        .append_pair("datastoreName", coordinate.datastore())
        .append_pair("scope", coordinate.scope())
        .append_pair("entryKey", coordinate.key())
        .append_pair("versionId", version_id);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build an ordered datastore entry listing request.
pub fn list_ordered_entries(
    base: &Url,
    credentials: &Credentials,
    universe_id: u64,
    datastore: &str,
    scope: &str,
    order_by: Option<&str>,
    page_token: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    require_name(datastore, "ordered datastore name")?;
    let universe = universe_id.to_string();
    let scope = if scope.trim().is_empty() {
        DEFAULT_SCOPE
    } else {
        scope
    };
    let mut url = endpoint_url(
        base,
        &[
            "ordered-data-stores",
            "v1",
            "universes",
            &universe,
            "orderedDataStores",
            datastore,
            "scopes",
            scope,
            "entries",
        ],
    )?;
    url.query_pairs_mut()
        .append_pair("max_page_size", &ORDERED_PAGE_LIMIT.to_string());
    if let Some(order) = order_by {
        if !order.is_empty() {
            url.query_pairs_mut().append_pair("order_by", order);
        }
    }
    push_cursor(&mut url, "page_token", page_token);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build a sorted map item listing request.
pub fn list_sorted_map_items(
    base: &Url,
    credentials: &Credentials,
    universe_id: u64,
    map: &str,
    cursor: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    require_name(map, "sorted map name")?;
    let universe = universe_id.to_string();
    let mut url = endpoint_url(
        base,
        &[
            "memory-store",
            "v1",
            "universes",
            &universe,
            "sorted-maps",
            map,
            "items",
        ],
    )?;
    url.query_pairs_mut()
        .append_pair("maxItemsToReturn", &SORTED_MAP_PAGE_LIMIT.to_string());
    push_cursor(&mut url, "cursor", cursor);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}

/// Build a messaging topic publish request.
pub fn publish_message(
    base: &Url,
    credentials: &Credentials,
    universe_id: u64,
    topic: &str,
    message: &str,
) -> ApiResult<RequestDescriptor> {
    require_name(topic, "topic name")?;
    let universe = universe_id.to_string();
    let url = endpoint_url(
        base,
        &["messaging-service", "v1", "universes", &universe, "topics", topic],
    )?;
    let body = serde_json::json!({ "message": message }).to_string();

    let mut headers = auth_headers(credentials);
    headers.push(("content-type", "application/json".to_string()));
    headers.push((CONTENT_MD5_HEADER, content_md5(&body)));

    Ok(RequestDescriptor {
        method: Method::POST,
        url,
        headers,
        body: Some(body),
    })
}

/// Build a user restriction (ban list) listing request.
pub fn list_user_restrictions(
    base: &Url,
    credentials: &Credentials,
    universe_id: u64,
    page_token: Option<&str>,
) -> ApiResult<RequestDescriptor> {
    let universe = universe_id.to_string();
    let mut url = endpoint_url(
        base,
        &["universes", "v1", "universes", &universe, "user-restrictions"],
    )?;
    url.query_pairs_mut()
        .append_pair("maxPageSize", &RESTRICTION_PAGE_LIMIT.to_string());
    push_cursor(&mut url, "pageToken", page_token);

    Ok(RequestDescriptor {
        method: Method::GET,
        url,
        headers: auth_headers(credentials),
        body: None,
    })
}
