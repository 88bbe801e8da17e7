//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use printmesh_market::MarketConfig;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;
use crate::scenario::SimulationReport;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for SimulationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:>4}  {:<9}  {:<6}  DETAIL", "#", "ACTION", "RESULT")?;
        writeln!(writer, "{}", "─".repeat(72))?;
        for step in &self.steps {
            writeln!(
                writer,
                "{:>4}  {:<9}  {:<6}  {}",
                step.index,
                step.action,
                if step.ok { "ok" } else { "FAILED" },
                step.detail
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "{:<24}  {:>12}", "ACCOUNT", "BALANCE")?;
        writeln!(writer, "{}", "─".repeat(38))?;
        for line in &self.balances {
            writeln!(writer, "{:<24}  {:>12}", line.account.as_str(), line.balance.units())?;
        }

        writeln!(writer)?;
        writeln!(writer, "Escrowed:  {}", self.escrowed)?;
        writeln!(writer, "Events:    {}", self.events)?;
        Ok(())
    }
}

/// Effective market configuration for display.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ConfigView(pub MarketConfig);

impl TableDisplay for ConfigView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Market Configuration")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Signing window:   {} s", self.0.signing_window_secs)?;
        writeln!(writer, "Grace period:     {} s", self.0.grace_period_secs)?;
        writeln!(
            writer,
            "Reselect started: {}",
            if self.0.reselect_started_orders { "yes" } else { "no" }
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printmesh_ledger::{Amount, PrincipalId};

    use crate::scenario::{BalanceLine, StepOutcome};

    fn render<T: Serialize + TableDisplay>(format: Format, value: &T) -> String {
        let mut buf = Vec::new();
        OutputFormat::new(format).write(&mut buf, value).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    fn report() -> SimulationReport {
        SimulationReport {
            steps: vec![StepOutcome {
                index: 1,
                action: "sign",
                ok: false,
                detail: "order not found: o9".into(),
            }],
            balances: vec![BalanceLine {
                account: PrincipalId::new("alice"),
                balance: Amount::from_units(42),
            }],
            escrowed: Amount::ZERO,
            events: 1,
        }
    }

    #[test]
    fn report_table_marks_failures() {
        let out = render(Format::Table, &report());
        assert!(out.contains("FAILED"));
        assert!(out.contains("order not found: o9"));
        assert!(out.contains("alice"));
    }

    #[test]
    fn report_json_is_parseable() {
        let out = render(Format::Json, &report());
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["balances"][0]["balance"], 42);
        assert_eq!(value["steps"][0]["ok"], false);
    }

    #[test]
    fn config_view_renders_both_ways() {
        let view = ConfigView(MarketConfig::default());
        assert!(render(Format::Table, &view).contains("300 s"));
        let json: serde_json::Value =
            serde_json::from_str(&render(Format::Json, &view)).expect("json");
        assert_eq!(json["grace_period_secs"], 300);
        assert!(OutputFormat::new(Format::Json).is_json());
    }
}
