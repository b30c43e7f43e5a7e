//! Append-only transport log
//!
//! Records every request the engine issues (method + full URL) so callers
//! can display or inspect exactly what went over the wire. Entries are
//! appended pre-send, so failed and aborted requests show up too. No size
//! cap; the log is only emptied by an explicit [`TransportLog::clear`].

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportLogEntry {
    /// Local time the request was issued
    pub timestamp: DateTime<Utc>,
    /// HTTP method
    pub method: String,
    /// Full request URL, query string included
    pub url: String,
}

/// Process-wide, append-only list of issued requests.
///
/// Mutex-guarded so concurrent logical requests can record safely.
#[derive(Debug, Default)]
pub struct TransportLog {
    entries: Mutex<Vec<TransportLogEntry>>,
}

impl TransportLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one request record.
    pub fn record(&self, method: &str, url: &str) {
        let entry = TransportLogEntry {
            timestamp: Utc::now(),
            method: method.to_string(),
            url: url.to_string(),
        };
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.push(entry);
    }

    /// Snapshot of all entries, newest first (display order).
    pub fn entries(&self) -> Vec<TransportLogEntry> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.iter().rev().cloned().collect()
    }

    /// Number of recorded requests.
    pub fn len(&self) -> usize {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every recorded entry.
    pub fn clear(&self) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }
}
