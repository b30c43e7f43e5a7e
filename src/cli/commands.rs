//! CLI argument definitions and command execution

use crate::client::OpenCloudClient;
use crate::cli::CliError;
use crate::engine::{RequestEngine, RetryPolicy, TransportErrorPolicy};
use crate::export::csv::CsvEntrySink;
use crate::export::EntrySink;
use crate::shutdown::SharedShutdown;
use crate::{bulk::BulkExporter, Credentials, ResourceCoordinate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use url::Url;

/// Browse and edit Open Cloud datastore resources
#[derive(Debug, Parser)]
#[command(name = "opencloud-datastore-client", version)]
pub struct Cli {
    /// API key token
    #[arg(long, env = "OPENCLOUD_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Treat the target universe as production; mutating commands then
    /// require --yes
    #[arg(long)]
    pub production: bool,

    /// Confirm mutating commands against a production universe
    #[arg(long)]
    pub yes: bool,

    /// Upper bound on send attempts per logical request (default: retry
    /// until cancelled)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Retry network-level transport errors with backoff instead of
    /// failing fast
    #[arg(long)]
    pub retry_transport_errors: bool,

    /// Override the API base URL (testing, proxies)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the transport log after the command finishes
    #[arg(long)]
    pub show_requests: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List standard datastores in a universe
    ListDatastores {
        /// Universe id
        universe_id: u64,
        /// Only list datastores whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Stop after roughly this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List entry keys in a datastore
    ListEntries {
        /// Universe id
        universe_id: u64,
        /// Datastore name
        datastore: String,
        /// Scope to list; omit to list keys across all scopes
        #[arg(long)]
        scope: Option<String>,
        /// Only list keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Stop after roughly this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch one entry (coordinate: UNIVERSE/DATASTORE[/SCOPE]/KEY)
    GetEntry {
        /// Entry coordinate
        coordinate: String,
    },
    /// Store one entry value
    SetEntry {
        /// Entry coordinate
        coordinate: String,
        /// Value to store, exactly as given
        value: String,
        /// Comma-separated user ids to associate
        #[arg(long)]
        user_ids: Option<String>,
        /// Attributes blob (JSON object)
        #[arg(long)]
        attributes: Option<String>,
    },
    /// Delete one entry
    DeleteEntry {
        /// Entry coordinate
        coordinate: String,
    },
    /// List stored versions of one entry
    ListVersions {
        /// Entry coordinate
        coordinate: String,
        /// Sort order (Ascending/Descending)
        #[arg(long)]
        sort_order: Option<String>,
        /// Stop after roughly this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch one historical version of an entry
    GetVersion {
        /// Entry coordinate
        coordinate: String,
        /// Version token from list-versions
        version_id: String,
    },
    /// List entries of an ordered datastore
    ListOrdered {
        /// Universe id
        universe_id: u64,
        /// Ordered datastore name
        datastore: String,
        /// Scope (defaults to global)
        #[arg(long, default_value = "")]
        scope: String,
        /// Sort expression (e.g. "value desc")
        #[arg(long)]
        order_by: Option<String>,
        /// Stop after roughly this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List items of a memory-store sorted map
    ListSortedMap {
        /// Universe id
        universe_id: u64,
        /// Sorted map name
        map: String,
        /// Stop after roughly this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Publish a message to a messaging-service topic
    Publish {
        /// Universe id
        universe_id: u64,
        /// Topic name
        topic: String,
        /// Message payload
        message: String,
    },
    /// List the universe's user restrictions (ban list)
    ListRestrictions {
        /// Universe id
        universe_id: u64,
        /// Stop after roughly this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export every datastore entry in a universe to a CSV file
    Export {
        /// Universe id
        universe_id: u64,
        /// Output CSV path
        output: PathBuf,
        /// Only export datastores whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
}

impl Cli {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            transport_errors: if self.retry_transport_errors {
                TransportErrorPolicy::RetryWithBackoff
            } else {
                TransportErrorPolicy::Fatal
            },
        }
    }

    fn build_client(&self, shutdown: SharedShutdown) -> Result<OpenCloudClient, CliError> {
        let credentials = Credentials::new(self.api_key.clone(), self.production);
        let engine = RequestEngine::new(self.retry_policy()).with_shutdown(shutdown);
        let mut client = OpenCloudClient::new(credentials, engine);
        if let Some(base) = &self.base_url {
            let parsed = Url::parse(base)
                .map_err(|e| CliError::InvalidArgument(format!("bad base URL '{base}': {e}")))?;
            client = client.with_base_url(parsed);
        }
        Ok(client)
    }

    fn confirm_mutation(&self) -> Result<(), CliError> {
        if self.production && !self.yes {
            return Err(CliError::ConfigurationError(
                "refusing to modify a production universe without --yes".to_string(),
            ));
        }
        Ok(())
    }

    /// Execute the selected command.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let client = self.build_client(shutdown.clone())?;

        match &self.command {
            Commands::ListDatastores {
                universe_id,
                prefix,
                limit,
            } => {
                let listing = client
                    .list_datastores(*universe_id, prefix.as_deref(), *limit)
                    .await?;
                for datastore in &listing.items {
                    match &datastore.created_time {
                        Some(created) => println!("{}\t{}", datastore.name, created),
                        None => println!("{}", datastore.name),
                    }
                }
                info!("{} datastores", listing.len());
            }
            Commands::ListEntries {
                universe_id,
                datastore,
                scope,
                prefix,
                limit,
            } => {
                let listing = client
                    .list_entry_keys(
                        *universe_id,
                        datastore,
                        scope.as_deref(),
                        prefix.as_deref(),
                        *limit,
                    )
                    .await?;
                for key in &listing.items {
                    println!("{}\t{}", key.scope, key.key);
                }
                info!("{} keys", listing.len());
            }
            Commands::GetEntry { coordinate } => {
                let coordinate = ResourceCoordinate::parse(coordinate)?;
                match client.get_entry(&coordinate).await? {
                    Some(entry) => {
                        println!("type: {}", entry.kind);
                        if let Some(version) = &entry.version {
                            println!("version: {version}");
                        }
                        if let Some(ids) = &entry.user_ids {
                            println!("user ids: {ids:?}");
                        }
                        if let Some(attributes) = &entry.attributes {
                            println!("attributes: {attributes}");
                        }
                        println!("{}", entry.data_display);
                    }
                    None => println!("entry does not exist"),
                }
            }
            Commands::SetEntry {
                coordinate,
                value,
                user_ids,
                attributes,
            } => {
                self.confirm_mutation()?;
                let coordinate = ResourceCoordinate::parse(coordinate)?;
                let ids = user_ids.as_deref().map(parse_user_id_list).transpose()?;
                let version = client
                    .set_entry(&coordinate, value, ids.as_deref(), attributes.as_deref())
                    .await?;
                match version {
                    Some(version) => println!("stored {coordinate} (version {version})"),
                    None => println!("stored {coordinate}"),
                }
            }
            Commands::DeleteEntry { coordinate } => {
                self.confirm_mutation()?;
                let coordinate = ResourceCoordinate::parse(coordinate)?;
                if client.delete_entry(&coordinate).await? {
                    println!("deleted {coordinate}");
                } else {
                    println!("entry does not exist");
                }
            }
            Commands::ListVersions {
                coordinate,
                sort_order,
                limit,
            } => {
                let coordinate = ResourceCoordinate::parse(coordinate)?;
                let listing = client
                    .list_entry_versions(&coordinate, sort_order.as_deref(), *limit)
                    .await?;
                for version in &listing.items {
                    println!(
                        "{}\tdeleted={}\t{} bytes\t{}",
                        version.version,
                        version.deleted,
                        version.content_length,
                        version.created_time.as_deref().unwrap_or("-")
                    );
                }
                info!("{} versions", listing.len());
            }
            Commands::GetVersion {
                coordinate,
                version_id,
            } => {
                let coordinate = ResourceCoordinate::parse(coordinate)?;
                match client.get_entry_version(&coordinate, version_id).await? {
                    Some(entry) => {
                        println!("type: {}", entry.kind);
                        println!("{}", entry.data_display);
                    }
                    None => println!("version does not exist"),
                }
            }
            Commands::ListOrdered {
                universe_id,
                datastore,
                scope,
                order_by,
                limit,
            } => {
                let listing = client
                    .list_ordered_entries(
                        *universe_id,
                        datastore,
                        scope,
                        order_by.as_deref(),
                        *limit,
                    )
                    .await?;
                for entry in &listing.items {
                    println!("{}\t{}", entry.id, entry.value);
                }
                info!("{} entries", listing.len());
            }
            Commands::ListSortedMap {
                universe_id,
                map,
                limit,
            } => {
                let listing = client
                    .list_sorted_map_items(*universe_id, map, *limit)
                    .await?;
                for item in &listing.items {
                    match &item.sort_key {
                        Some(sort_key) => {
                            println!("{}\t{}\t{}", item.id, sort_key, item.value)
                        }
                        None => println!("{}\t-\t{}", item.id, item.value),
                    }
                }
                info!("{} items", listing.len());
            }
            Commands::Publish {
                universe_id,
                topic,
                message,
            } => {
                self.confirm_mutation()?;
                if client.publish_message(*universe_id, topic, message).await? {
                    println!("published to {topic}");
                } else {
                    println!("topic does not exist");
                }
            }
            Commands::ListRestrictions { universe_id, limit } => {
                let listing = client.list_user_restrictions(*universe_id, *limit).await?;
                for restriction in &listing.items {
                    println!(
                        "{}\tactive={}\t{}",
                        restriction.user,
                        restriction.active,
                        restriction.display_reason.as_deref().unwrap_or("-")
                    );
                }
                info!("{} restrictions", listing.len());
            }
            Commands::Export {
                universe_id,
                output,
                prefix,
            } => {
                let mut sink = CsvEntrySink::new(output)?;
                let mut exporter = BulkExporter::new(&client).with_shutdown(shutdown.clone());
                if let Some(prefix) = prefix {
                    exporter = exporter.with_prefix(prefix.clone());
                }
                let report = exporter.export_universe(*universe_id, &mut sink).await?;
                sink.close()?;
                println!(
                    "exported {} entries from {} datastores ({} failed{})",
                    report.entries_exported,
                    report.datastores,
                    report.entries_failed,
                    if report.cancelled { ", cancelled" } else { "" }
                );
            }
        }

        if self.show_requests {
            for entry in client.engine().transport_log().entries() {
                println!(
                    "{}\t{}\t{}",
                    entry.timestamp.format("%H:%M:%S%.3f"),
                    entry.method,
                    entry.url
                );
            }
        }

        Ok(())
    }
}

fn parse_user_id_list(raw: &str) -> Result<Vec<u64>, CliError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>().map_err(|_| {
                CliError::InvalidArgument(format!("user id must be an integer, got '{part}'"))
            })
        })
        .collect()
}
