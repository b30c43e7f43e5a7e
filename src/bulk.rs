//! Bulk export orchestration
//!
//! Walks a universe's standard datastores end to end: list datastores, list
//! every entry key (all scopes), fetch each entry's detail and hand the
//! decoded entry to a sink. Strictly sequential; each step is one logical
//! request with its own retry and pagination state.
//!
//! A failed entry fetch is counted and skipped so one bad key cannot sink a
//! long export; listing failures and cancellation stop the walk.

use crate::client::OpenCloudClient;
use crate::coordinate::CoordinateError;
use crate::engine::EngineError;
use crate::export::{EntrySink, ExportError};
use crate::shutdown::SharedShutdown;
use crate::ResourceCoordinate;
use tracing::{debug, info, warn};

/// Bulk export errors
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    /// Engine failure while listing resources
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Sink failure while persisting an entry
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// A listed key produced an invalid coordinate
    #[error("coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),
}

/// Outcome of a bulk export walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkExportReport {
    /// Datastores enumerated
    pub datastores: usize,
    /// Entries fetched and handed to the sink
    pub entries_exported: u64,
    /// Entries skipped after a fetch failure
    pub entries_failed: u64,
    /// Whether the walk stopped early on shutdown
    pub cancelled: bool,
}

/// Sequential bulk export walker.
pub struct BulkExporter<'a> {
    client: &'a OpenCloudClient,
    prefix: Option<String>,
    shutdown: Option<SharedShutdown>,
}

impl<'a> BulkExporter<'a> {
    /// Create a walker over the given client.
    pub fn new(client: &'a OpenCloudClient) -> Self {
        Self {
            client,
            prefix: None,
            shutdown: None,
        }
    }

    /// Restrict the walk to datastores whose name starts with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Export every entry of every standard datastore in the universe.
    ///
    /// The sink is flushed on completion but not closed; the caller owns
    /// its lifecycle.
    pub async fn export_universe<S: EntrySink>(
        &self,
        universe_id: u64,
        sink: &mut S,
    ) -> Result<BulkExportReport, BulkError> {
        let mut report = BulkExportReport::default();

        let datastores = self
            .client
            .list_datastores(universe_id, self.prefix.as_deref(), None)
            .await?;
        info!(
            "exporting universe {}: {} datastores",
            universe_id,
            datastores.len()
        );

        'datastores: for datastore in &datastores.items {
            report.datastores += 1;
            if self.cancelled() {
                report.cancelled = true;
                break;
            }

            let keys = self
                .client
                .list_entry_keys(universe_id, &datastore.name, None, None, None)
                .await?;
            debug!("datastore {}: {} keys", datastore.name, keys.len());

            for key in &keys.items {
                if self.cancelled() {
                    report.cancelled = true;
                    break 'datastores;
                }

                let coordinate = ResourceCoordinate::new(
                    universe_id,
                    datastore.name.clone(),
                    key.scope.clone(),
                    key.key.clone(),
                )?;

                match self.client.get_entry(&coordinate).await {
                    Ok(Some(entry)) => {
                        sink.write_entry(&entry)?;
                        report.entries_exported += 1;
                    }
                    Ok(None) => {
                        // Deleted between listing and fetch; nothing to export.
                        debug!("entry vanished before fetch: {coordinate}");
                    }
                    Err(EngineError::Cancelled) => {
                        report.cancelled = true;
                        break 'datastores;
                    }
                    Err(error) => {
                        warn!("skipping entry {coordinate}: {error}");
                        report.entries_failed += 1;
                    }
                }
            }
        }

        sink.flush()?;
        info!(
            "export finished: {} exported, {} failed, cancelled={}",
            report.entries_exported, report.entries_failed, report.cancelled
        );
        Ok(report)
    }
}
