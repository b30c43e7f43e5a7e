//! Resource coordinate parsing and validation
//!
//! Implements the standardized coordinate format: UNIVERSE/DATASTORE/SCOPE/KEY

use std::fmt;

/// Scope applied when a coordinate omits one.
pub const DEFAULT_SCOPE: &str = "global";

/// Coordinate of a single datastore entry: universe id, datastore name,
/// scope and key name.
///
/// An empty scope is normalized to [`DEFAULT_SCOPE`] at construction time.
///
/// # Examples
///
/// ```
/// use opencloud_datastore_client::coordinate::ResourceCoordinate;
///
/// let coord = ResourceCoordinate::parse("12345/PlayerData/global/user_42").unwrap();
/// assert_eq!(coord.universe_id(), 12345);
/// assert_eq!(coord.datastore(), "PlayerData");
/// assert_eq!(coord.scope(), "global");
/// assert_eq!(coord.key(), "user_42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceCoordinate {
    universe_id: u64,
    datastore: String,
    scope: String,
    key: String,
}

impl ResourceCoordinate {
    /// Build a coordinate from its components.
    ///
    /// An empty scope defaults to `global`.
    ///
    /// # Errors
    ///
    /// Returns an error when the datastore or key name is empty.
    pub fn new(
        universe_id: u64,
        datastore: impl Into<String>,
        scope: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let datastore = datastore.into();
        let scope = scope.into();
        let key = key.into();

        if datastore.trim().is_empty() {
            return Err(CoordinateError::InvalidFormat(
                "datastore name cannot be empty".to_string(),
            ));
        }
        if key.trim().is_empty() {
            return Err(CoordinateError::InvalidFormat(
                "entry key cannot be empty".to_string(),
            ));
        }

        let scope = if scope.trim().is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            scope
        };

        Ok(Self {
            universe_id,
            datastore,
            scope,
            key,
        })
    }

    /// Parse a coordinate string into a `ResourceCoordinate`.
    ///
    /// # Format
    ///
    /// `UNIVERSE/DATASTORE/SCOPE/KEY` or `UNIVERSE/DATASTORE/KEY`
    /// (three components mean the scope is omitted and defaults to `global`).
    ///
    /// # Errors
    ///
    /// Returns an error if the universe id is not an integer, a required
    /// component is empty, or the component count is wrong.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let parts: Vec<&str> = s.split('/').collect();
        let (universe_raw, datastore, scope, key) = match parts.as_slice() {
            [u, d, k] => (*u, *d, "", *k),
            [u, d, s, k] => (*u, *d, *s, *k),
            _ => {
                return Err(CoordinateError::InvalidFormat(
                    "invalid coordinate format: expected UNIVERSE/DATASTORE[/SCOPE]/KEY"
                        .to_string(),
                ))
            }
        };

        let universe_id = universe_raw.trim().parse::<u64>().map_err(|_| {
            CoordinateError::InvalidUniverse(format!(
                "universe id must be a positive integer, got '{universe_raw}'"
            ))
        })?;

        Self::new(universe_id, datastore.trim(), scope.trim(), key.trim())
    }

    /// Universe (experience) id.
    pub fn universe_id(&self) -> u64 {
        self.universe_id
    }

    /// Datastore name.
    pub fn datastore(&self) -> &str {
        &self.datastore
    }

    /// Scope, always non-empty.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Entry key name.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ResourceCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.universe_id, self.datastore, self.scope, self.key
        )
    }
}

/// Coordinate parsing and validation errors
#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    /// Malformed coordinate string
    #[error("invalid coordinate: {0}")]
    InvalidFormat(String),

    /// Universe id component is not an integer
    #[error("invalid universe id: {0}")]
    InvalidUniverse(String),
}
