//! In-memory payment ledger.
//!
//! Mirrors the behaviour of a token ledger closely enough for development
//! and tests: balances, allowances, and failure injection for exercising
//! rollback paths in callers.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::ledger::PaymentLedger;
use crate::principal::PrincipalId;

#[derive(Debug, Default)]
struct SimulatedState {
    balances: HashMap<PrincipalId, Amount>,
    allowances: HashMap<(PrincipalId, PrincipalId), Amount>,
    pending_failures: u32,
}

impl SimulatedState {
    fn balance_of(&self, account: &PrincipalId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn allowance_of(&self, owner: &PrincipalId, spender: &PrincipalId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn take_injected_failure(&mut self) -> Result<()> {
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(LedgerError::transfer_failed("injected failure"));
        }
        Ok(())
    }

    fn move_value(&mut self, from: &PrincipalId, to: &PrincipalId, amount: Amount) -> Result<()> {
        let available = self.balance_of(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                required: amount,
                available,
            })?;
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::transfer_failed(format!("balance overflow for {to}")))?;

        self.balances.insert(from.clone(), remaining);
        // Self-transfers must net to zero.
        let credited = if from == to { available } else { credited };
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

/// A thread-safe in-memory ledger.
#[derive(Debug, Default)]
pub struct SimulatedLedger {
    state: Mutex<SimulatedState>,
}

impl SimulatedLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `account` out of thin air.
    pub fn mint(&self, account: &PrincipalId, amount: Amount) {
        let mut state = self.state.lock();
        let balance = state.balance_of(account).saturating_add(amount);
        state.balances.insert(account.clone(), balance);
        info!(account = %account, amount = %amount, "minted");
    }

    /// Authorize `spender` to move up to `amount` of `owner`'s funds.
    ///
    /// Replaces any previous allowance.
    pub fn approve(&self, owner: &PrincipalId, spender: &PrincipalId, amount: Amount) {
        let mut state = self.state.lock();
        state
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        debug!(owner = %owner, spender = %spender, amount = %amount, "allowance set");
    }

    /// Make the next `count` transfer calls fail without side effects.
    pub fn fail_next_transfers(&self, count: u32) {
        self.state.lock().pending_failures = count;
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.state.lock().balances.values().copied().sum()
    }
}

impl PaymentLedger for SimulatedLedger {
    fn balance(&self, account: &PrincipalId) -> Result<Amount> {
        Ok(self.state.lock().balance_of(account))
    }

    fn allowance(&self, owner: &PrincipalId, spender: &PrincipalId) -> Result<Amount> {
        Ok(self.state.lock().allowance_of(owner, spender))
    }

    fn transfer(&self, from: &PrincipalId, to: &PrincipalId, amount: Amount) -> Result<()> {
        let mut state = self.state.lock();
        state.take_injected_failure()?;
        state.move_value(from, to, amount)?;
        debug!(from = %from, to = %to, amount = %amount, "transfer completed");
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &PrincipalId,
        owner: &PrincipalId,
        to: &PrincipalId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.take_injected_failure()?;

        let allowance = state.allowance_of(owner, spender);
        let remaining = allowance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                required: amount,
                allowance,
            })?;

        state.move_value(owner, to, amount)?;
        state
            .allowances
            .insert((owner.clone(), spender.clone()), remaining);

        debug!(
            spender = %spender,
            owner = %owner,
            to = %to,
            amount = %amount,
            "delegated transfer completed"
        );
        Ok(())
    }
}
