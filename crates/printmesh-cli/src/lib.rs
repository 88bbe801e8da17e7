//! # printmesh-cli
//!
//! Command-line tooling for the printmesh marketplace.
//!
//! Provides commands for:
//! - Replaying scenario files against a simulated ledger and clock
//! - Inspecting the effective market configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod output;
pub mod scenario;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::{ConfigView, OutputFormat, TableDisplay};
pub use scenario::{Scenario, SimulationReport};

use printmesh_market::MarketConfig;

/// Resolves the market configuration from an optional file path.
///
/// # Errors
///
/// Returns [`CliError::Market`] if the file is unreadable or invalid.
pub fn load_config(path: Option<&std::path::Path>) -> Result<MarketConfig, CliError> {
    match path {
        Some(path) => Ok(MarketConfig::from_json_file(path)?),
        None => Ok(MarketConfig::default()),
    }
}
