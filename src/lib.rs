//! # Open Cloud Datastore Client
//!
//! A library and CLI for reading and editing Open Cloud key-value storage
//! resources (standard datastores, ordered datastores, memory-store sorted
//! maps, messaging topics, ban lists) over the REST API.
//!
//! ## Features
//!
//! - **Typed operations**: every endpoint returns validated, typed results
//! - **Cursor pagination**: list operations walk server cursors to completion
//! - **Throttle handling**: HTTP 429 responses back off on a fixed schedule,
//!   502/504 responses are resent immediately
//! - **Transport log**: every issued request is recorded for inspection
//! - **Bulk export**: walk a whole universe's datastores into a tabular sink
//!
//! ## Quick Start
//!
//! ```no_run
//! use opencloud_datastore_client::client::OpenCloudClient;
//! use opencloud_datastore_client::engine::{RequestEngine, RetryPolicy};
//! use opencloud_datastore_client::Credentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("api-key-token", false);
//! let engine = RequestEngine::new(RetryPolicy::default());
//! let client = OpenCloudClient::new(credentials, engine);
//!
//! let listing = client.list_datastores(12345, None, Some(200)).await?;
//! for datastore in &listing.items {
//!     println!("{}", datastore.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`coordinate`] - Resource coordinate parsing and validation
//! - [`api`] - Request builders, response parsers and payload classification
//! - [`engine`] - The request/retry/pagination state machine
//! - [`client`] - Typed operation facade over the engine
//! - [`clock`] - Server clock estimate from response `Date` headers
//! - [`transport_log`] - Append-only record of issued requests
//! - [`export`] - Entry sink contract and CSV reference sink
//! - [`bulk`] - Sequential bulk export walker

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// Request builders, response parsers and payload classification
pub mod api;

/// Bulk export orchestration
pub mod bulk;

/// CLI command implementations
pub mod cli;

/// Typed operation facade
pub mod client;

/// Server clock estimate from response date headers
pub mod clock;

/// Resource coordinate parsing and validation
pub mod coordinate;

/// Request/retry/pagination engine
pub mod engine;

/// Entry export sinks
pub mod export;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Append-only transport log
pub mod transport_log;

// Re-export commonly used types
pub use coordinate::ResourceCoordinate;

/// Credentials for the Open Cloud API: an opaque bearer token plus a flag
/// marking the target universe as production.
///
/// Immutable once constructed; the production flag only adds confirmation
/// friction to destructive commands, it never changes request contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    production: bool,
}

impl Credentials {
    /// Create credentials from an API key token.
    pub fn new(api_key: impl Into<String>, production: bool) -> Self {
        Self {
            api_key: api_key.into(),
            production,
        }
    }

    /// The bearer token sent in the `x-api-key` header.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Whether the target universe is flagged as production.
    pub fn is_production(&self) -> bool {
        self.production
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token itself.
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("production", &self.production)
            .finish()
    }
}

/// Classified type of a stored entry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// JSON object or array
    #[serde(rename = "JSON")]
    Json,
    /// JSON-quoted string
    String,
    /// Numeric literal
    Number,
    /// Boolean literal `true` or `false`
    Bool,
    /// Unclassifiable payload
    Error,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::Json => "JSON",
            EntryKind::String => "String",
            EntryKind::Number => "Number",
            EntryKind::Bool => "Bool",
            EntryKind::Error => "Error",
        };
        write!(f, "{s}")
    }
}

/// A single datastore as returned by the datastore listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatastoreInfo {
    /// Datastore name
    pub name: String,
    /// Creation time as reported by the server (opaque, not converted)
    pub created_time: Option<String>,
}

/// A single entry key as returned by the entry listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryKeyInfo {
    /// Scope the key lives in
    pub scope: String,
    /// Key name
    pub key: String,
}

/// Metadata for one version of a stored entry.
///
/// Timestamps are kept as the opaque strings the server sent; no local
/// time-zone conversion is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryVersionInfo {
    /// Server-issued version token
    pub version: String,
    /// Whether this version marks a deletion
    pub deleted: bool,
    /// Stored content length in bytes
    pub content_length: u64,
    /// Version creation time
    pub created_time: Option<String>,
    /// Creation time of the underlying object
    pub object_created_time: Option<String>,
}

/// A single entry from an ordered datastore listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderedEntry {
    /// Entry id (the key within the ordered datastore)
    pub id: String,
    /// Stored integer value
    pub value: i64,
    /// Full resource path, when the server reports one
    pub path: Option<String>,
}

/// A single item from a memory-store sorted map listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortedMapItem {
    /// Item id
    pub id: String,
    /// Stored value, serialized back to JSON text
    pub value: String,
    /// Optional sort key
    pub sort_key: Option<String>,
    /// Expiration time as reported by the server
    pub expire_time: Option<String>,
}

/// A single ban-list entry from the user restriction listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRestriction {
    /// Restricted user resource (e.g. `users/123`)
    pub user: String,
    /// Whether the restriction is currently active
    pub active: bool,
    /// Restriction duration, when bounded
    pub duration: Option<String>,
    /// Internal reason
    pub private_reason: Option<String>,
    /// Reason shown to the user
    pub display_reason: Option<String>,
}

/// Accumulated result of a paginated request: the items collected so far and
/// the last cursor the server issued.
///
/// The item list only grows; a page that yields zero new items or no cursor
/// terminates the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    /// Items accumulated across pages
    pub items: Vec<T>,
    /// Last-seen cursor; `None` once the sequence is exhausted
    pub cursor: Option<String>,
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }
}

impl<T> PagedResult<T> {
    /// Number of items accumulated so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was accumulated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A fully decoded datastore entry: coordinate, version metadata, raw and
/// display payloads, classified type and optional metadata blobs.
///
/// Constructed once from a successful detail response; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    /// Resource coordinate this entry was fetched from
    pub coordinate: ResourceCoordinate,
    /// Server-issued version token
    pub version: Option<String>,
    /// Entry creation time (opaque server string)
    pub created_time: Option<String>,
    /// Version creation time (opaque server string)
    pub version_created_time: Option<String>,
    /// Raw payload exactly as stored
    pub data_raw: String,
    /// Display payload (unquoted for string entries, raw otherwise)
    pub data_display: String,
    /// Classified payload type
    pub kind: EntryKind,
    /// Associated user ids, when present
    pub user_ids: Option<Vec<u64>>,
    /// Attributes blob as JSON text, when present
    pub attributes: Option<String>,
}

impl DecodedEntry {
    /// Parse the raw payload as a number, when it is numeric.
    ///
    /// Used by tabular sinks that carry a dedicated numeric column.
    pub fn numeric_value(&self) -> Option<f64> {
        self.data_raw.trim().parse::<f64>().ok()
    }

    /// The decoded string value, only for entries classified as strings.
    pub fn string_value(&self) -> Option<&str> {
        match self.kind {
            EntryKind::String => Some(&self.data_display),
            _ => None,
        }
    }
}
