//! Scenario replay.
//!
//! A scenario seeds a [`SimulatedLedger`], registers providers, and then
//! runs a list of marketplace steps against a [`ManualClock`]. Step
//! failures are recorded in the report rather than aborting the run, so a
//! scenario can exercise rejections as well as the happy path.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use printmesh_ledger::{Amount, PaymentLedger, PrincipalId, SimulatedLedger};
use printmesh_market::{Clock, ManualClock, MarketConfig, OrderId, OrderRequest, PrintMarket};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CliError;

fn default_custody_account() -> PrincipalId {
    PrincipalId::new("escrow")
}

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Account that holds escrow.
    #[serde(default = "default_custody_account")]
    pub custody_account: PrincipalId,
    /// Starting instant of the manual clock. Defaults to the Unix epoch.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// Funded accounts.
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    /// Providers registered before the first step.
    #[serde(default)]
    pub providers: Vec<ProviderSeed>,
    /// Steps to run, in order.
    pub steps: Vec<Step>,
}

/// Initial funding for one account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSeed {
    /// Account id.
    pub id: PrincipalId,
    /// Minted balance.
    pub balance: Amount,
    /// Allowance granted to the custody account. Defaults to `balance`.
    #[serde(default)]
    pub approve: Option<Amount>,
}

/// A provider to register.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSeed {
    /// Provider id.
    pub id: PrincipalId,
    /// Free-form details.
    #[serde(default)]
    pub details: String,
}

/// One marketplace action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Open an order.
    Create(OrderRequest),
    /// Provider signs an order.
    Sign {
        /// Target order.
        order: OrderId,
        /// Calling principal.
        caller: PrincipalId,
    },
    /// Provider starts its next order.
    Execute {
        /// Calling provider.
        provider: PrincipalId,
    },
    /// Provider completes an order.
    Complete {
        /// Target order.
        order: OrderId,
        /// Calling principal.
        caller: PrincipalId,
    },
    /// Customer disputes completion.
    Dispute {
        /// Target order.
        order: OrderId,
        /// Calling principal.
        caller: PrincipalId,
    },
    /// Customer reclaims an unsigned, lapsed order.
    Refund {
        /// Target order.
        order: OrderId,
        /// Calling principal.
        caller: PrincipalId,
    },
    /// Provider claims payment.
    Payout {
        /// Target order.
        order: OrderId,
        /// Calling principal.
        caller: PrincipalId,
    },
    /// Move the clock forward.
    Advance {
        /// Seconds to advance.
        secs: u32,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Sign { .. } => "sign",
            Self::Execute { .. } => "execute",
            Self::Complete { .. } => "complete",
            Self::Dispute { .. } => "dispute",
            Self::Refund { .. } => "refund",
            Self::Payout { .. } => "payout",
            Self::Advance { .. } => "advance",
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Position in the scenario, from 1.
    pub index: usize,
    /// Step kind.
    pub action: &'static str,
    /// Whether the step succeeded.
    pub ok: bool,
    /// Success detail or error message.
    pub detail: String,
}

/// Final balance of one account.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceLine {
    /// Account id.
    pub account: PrincipalId,
    /// Balance after the last step.
    pub balance: Amount,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Per-step outcomes.
    pub steps: Vec<StepOutcome>,
    /// Balances of every seeded account, provider, and the custody account.
    pub balances: Vec<BalanceLine>,
    /// Value still escrowed for live orders.
    pub escrowed: Amount,
    /// Number of journal events.
    pub events: usize,
}

impl Scenario {
    /// Reads a scenario from a JSON file.
    ///
    /// # Errors
    ///
    /// [`CliError::Scenario`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CliError::Scenario(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| CliError::Scenario(format!("parsing {}: {e}", path.display())))
    }

    /// Runs every step and reports the outcome.
    ///
    /// # Errors
    ///
    /// Fails only if the market cannot be built or a provider cannot be
    /// registered. Step failures are part of the report.
    pub fn run(&self, config: MarketConfig) -> Result<SimulationReport, CliError> {
        let ledger = Arc::new(SimulatedLedger::new());
        let clock = Arc::new(ManualClock::new(
            self.start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        ));
        let market = PrintMarket::new(
            ledger.clone(),
            self.custody_account.clone(),
            clock.clone(),
            config,
        )?;

        for account in &self.accounts {
            ledger.mint(&account.id, account.balance);
            ledger.approve(
                &account.id,
                &self.custody_account,
                account.approve.unwrap_or(account.balance),
            );
        }
        for provider in &self.providers {
            market.register_provider(provider.id.clone(), provider.details.clone())?;
        }

        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let result = apply(&market, &clock, step);
                debug!(step = i + 1, action = step.name(), ok = result.is_ok(), "step applied");
                let (ok, detail) = match result {
                    Ok(detail) => (true, detail),
                    Err(e) => (false, e.to_string()),
                };
                StepOutcome {
                    index: i + 1,
                    action: step.name(),
                    ok,
                    detail,
                }
            })
            .collect::<Vec<_>>();

        let mut accounts: Vec<PrincipalId> = self.accounts.iter().map(|a| a.id.clone()).collect();
        accounts.extend(self.providers.iter().map(|p| p.id.clone()));
        accounts.push(self.custody_account.clone());
        let mut seen = HashSet::new();
        accounts.retain(|id| seen.insert(id.clone()));
        let balances = accounts
            .into_iter()
            .map(|account| {
                let balance = ledger.balance(&account)?;
                Ok(BalanceLine { account, balance })
            })
            .collect::<Result<Vec<_>, printmesh_ledger::LedgerError>>()
            .map_err(|e| CliError::Scenario(e.to_string()))?;

        info!(
            steps = steps.len(),
            failed = steps.iter().filter(|s| !s.ok).count(),
            "scenario finished"
        );
        Ok(SimulationReport {
            steps,
            balances,
            escrowed: market.escrowed_total(),
            events: market.events().len(),
        })
    }
}

fn apply(
    market: &PrintMarket,
    clock: &ManualClock,
    step: &Step,
) -> printmesh_market::Result<String> {
    match step {
        Step::Create(request) => {
            market.create_order(request.clone())?;
            Ok(format!("{} escrowed for {}", request.price, request.id))
        }
        Step::Sign { order, caller } => {
            market.sign_order(order, caller)?;
            Ok(format!("{order} signed"))
        }
        Step::Execute { provider } => {
            let started = market.execute(provider)?;
            Ok(format!("{started} started"))
        }
        Step::Complete { order, caller } => {
            market.complete_order(order, caller)?;
            Ok(format!("{order} completed"))
        }
        Step::Dispute { order, caller } => {
            market.report_uncomplete(order, caller)?;
            Ok(format!("{order} disputed"))
        }
        Step::Refund { order, caller } => {
            let amount = market.refund(order, caller)?;
            Ok(format!("{amount} refunded to {caller}"))
        }
        Step::Payout { order, caller } => {
            let amount = market.payout(order, caller)?;
            Ok(format!("{amount} paid to {caller}"))
        }
        Step::Advance { secs } => {
            clock.advance(Duration::seconds(i64::from(*secs)));
            Ok(format!("clock at {}", clock.now().to_rfc3339()))
        }
    }
}
