//! Entry export sinks
//!
//! The bulk walker hands one fully-decoded entry at a time to an
//! [`EntrySink`]; what the sink does with it (CSV file, database, stdout)
//! is its own concern. Schema evolution lives behind this boundary.

use crate::DecodedEntry;

pub mod csv;

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    IoError(String),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Flush failed
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Accepts validated, decoded entries one at a time.
pub trait EntrySink {
    /// Persist a single decoded entry.
    fn write_entry(&mut self, entry: &DecodedEntry) -> ExportResult<()>;

    /// Flush buffered data to the backing store.
    fn flush(&mut self) -> ExportResult<()>;

    /// Finalize the sink, flushing and releasing resources.
    fn close(self) -> ExportResult<()>
    where
        Self: Sized;
}
