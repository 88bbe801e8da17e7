//! Marketplace configuration.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MarketError, Result};

/// Time windows and scheduling behaviour for a marketplace instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Seconds after creation during which the provider may sign.
    pub signing_window_secs: u64,
    /// Seconds after the execution deadline during which the customer may
    /// dispute, and before which payout is locked.
    pub grace_period_secs: u64,
    /// Whether `execute` may re-select an order that was already started
    /// and not yet completed. Re-selection restarts its timer.
    pub reselect_started_orders: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            signing_window_secs: 300,
            grace_period_secs: 300,
            reselect_started_orders: true,
        }
    }
}

impl MarketConfig {
    /// Creates a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signing window.
    #[must_use]
    pub const fn with_signing_window_secs(mut self, secs: u64) -> Self {
        self.signing_window_secs = secs;
        self
    }

    /// Sets the dispute grace period.
    #[must_use]
    pub const fn with_grace_period_secs(mut self, secs: u64) -> Self {
        self.grace_period_secs = secs;
        self
    }

    /// Sets whether started orders stay selectable.
    #[must_use]
    pub const fn with_reselect_started_orders(mut self, reselect: bool) -> Self {
        self.reselect_started_orders = reselect;
        self
    }

    /// Loads a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Config`] if the file cannot be read, does not
    /// parse, or fails validation.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MarketError::Config(format!("reading {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| MarketError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "loaded market config");
        Ok(config)
    }

    /// Checks that both windows are non-empty and representable.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Config`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        check_window("signing_window_secs", self.signing_window_secs)?;
        check_window("grace_period_secs", self.grace_period_secs)
    }

    /// The signing window as a duration.
    #[must_use]
    pub fn signing_window(&self) -> Duration {
        secs_to_duration(self.signing_window_secs)
    }

    /// The grace period as a duration.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        secs_to_duration(self.grace_period_secs)
    }
}

fn check_window(name: &str, secs: u64) -> Result<()> {
    if secs == 0 {
        return Err(MarketError::Config(format!("{name} must be positive")));
    }
    if i64::try_from(secs).ok().and_then(Duration::try_seconds).is_none() {
        return Err(MarketError::Config(format!("{name} is out of range")));
    }
    Ok(())
}

fn secs_to_duration(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
