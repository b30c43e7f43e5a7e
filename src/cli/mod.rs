//! CLI command implementations

pub mod commands;
pub mod error;

pub use commands::{Cli, Commands};
pub use error::CliError;
