//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// printmesh - escrowed print-job marketplace tooling.
#[derive(Parser, Debug, Clone)]
#[command(name = "printmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Market configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long, env = "PRINTMESH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay a scenario file against a simulated ledger and manual clock.
    Simulate {
        /// Path to the scenario JSON file.
        scenario: PathBuf,
    },

    /// Print the effective market configuration.
    Config,
}
