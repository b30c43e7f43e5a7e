//! CLI error types and conversions

use crate::api::ApiError;
use crate::bulk::BulkError;
use crate::coordinate::CoordinateError;
use crate::engine::EngineError;
use crate::export::ExportError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Coordinate error
    #[error("coordinate error: {0}")]
    CoordinateError(#[from] CoordinateError),

    /// Request build error
    #[error("request error: {0}")]
    ApiError(#[from] ApiError),

    /// Engine error
    #[error("engine error: {0}")]
    EngineError(#[from] EngineError),

    /// Bulk export error
    #[error("bulk export error: {0}")]
    BulkError(#[from] BulkError),

    /// Export sink error
    #[error("export error: {0}")]
    ExportError(#[from] ExportError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
