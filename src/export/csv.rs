//! CSV entry sink implementation

use super::{EntrySink, ExportError, ExportResult};
use crate::DecodedEntry;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Flush the writer every N entries.
const FLUSH_INTERVAL: u64 = 1000;

/// CSV record for one decoded entry.
///
/// `data_string` is populated only for string entries and `data_number`
/// only when the raw payload parses as a number; the other columns are
/// always present.
#[derive(Debug, Serialize)]
struct EntryRecord {
    universe_id: u64,
    datastore: String,
    scope: String,
    key: String,
    version: String,
    entry_type: String,
    data_raw: String,
    data_string: String,
    data_number: Option<f64>,
    user_ids: String,
    attributes: String,
}

impl From<&DecodedEntry> for EntryRecord {
    fn from(entry: &DecodedEntry) -> Self {
        let user_ids = entry
            .user_ids
            .as_ref()
            .and_then(|ids| serde_json::to_string(ids).ok())
            .unwrap_or_default();
        Self {
            universe_id: entry.coordinate.universe_id(),
            datastore: entry.coordinate.datastore().to_string(),
            scope: entry.coordinate.scope().to_string(),
            key: entry.coordinate.key().to_string(),
            version: entry.version.clone().unwrap_or_default(),
            entry_type: entry.kind.to_string(),
            data_raw: entry.data_raw.clone(),
            data_string: entry.string_value().unwrap_or_default().to_string(),
            data_number: entry.numeric_value(),
            user_ids,
            attributes: entry.attributes.clone().unwrap_or_default(),
        }
    }
}

/// CSV sink writing one row per decoded entry.
pub struct CsvEntrySink {
    writer: Writer<BufWriter<File>>,
    entries_written: u64,
}

impl CsvEntrySink {
    /// Create a new CSV sink at `path` with the default buffer size.
    pub fn new<P: AsRef<Path>>(path: P) -> ExportResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new CSV sink with a custom buffer size.
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> ExportResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV entry sink: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ExportError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| ExportError::IoError(format!("Failed to create file: {}", e)))?;
        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        let csv_writer = Writer::from_writer(buf_writer);

        Ok(Self {
            writer: csv_writer,
            entries_written: 0,
        })
    }

    /// Number of entries written so far.
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }
}

impl EntrySink for CsvEntrySink {
    fn write_entry(&mut self, entry: &DecodedEntry) -> ExportResult<()> {
        let record = EntryRecord::from(entry);

        self.writer
            .serialize(&record)
            .map_err(|e| ExportError::CsvError(format!("Failed to write entry: {}", e)))?;

        self.entries_written += 1;

        if self.entries_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!("Progress: {} entries written", self.entries_written);
        }

        Ok(())
    }

    fn flush(&mut self) -> ExportResult<()> {
        self.writer
            .flush()
            .map_err(|e| ExportError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> ExportResult<()> {
        debug!(
            "Closing CSV entry sink: {} total entries written",
            self.entries_written
        );

        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| ExportError::IoError(format!("Failed to get inner writer: {}", e)))?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| ExportError::IoError(format!("Failed to get file handle: {}", e)))?;
        file.sync_all()
            .map_err(|e| ExportError::IoError(format!("Failed to sync file: {}", e)))?;

        info!(
            "CSV entry sink closed: {} entries written",
            self.entries_written
        );
        Ok(())
    }
}
