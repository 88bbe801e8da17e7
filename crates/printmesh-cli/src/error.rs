//! CLI error types.

use printmesh_market::MarketError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The scenario file is unreadable or malformed.
    #[error("scenario error: {0}")]
    Scenario(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// Marketplace setup failed.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
