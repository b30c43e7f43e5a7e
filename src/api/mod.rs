//! API layer: request builders, response parsers and payload classification
//!
//! Everything in this module is pure: builders map parameters to immutable
//! request descriptors, parsers map response bodies to typed results. No I/O
//! happens here; the [`crate::engine`] owns the wire.

pub mod classify;
pub mod request;
pub mod response;

/// API layer errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A request could not be built from the given parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for API layer operations
pub type ApiResult<T> = Result<T, ApiError>;
