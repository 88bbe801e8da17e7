//! Value custody for escrowed orders.
//!
//! The custodian is the only component that moves value. It wraps a
//! [`PaymentLedger`] and a dedicated custody account; locked funds sit in
//! that account until released to a customer (refund) or provider (payout).

use std::fmt;
use std::sync::Arc;

use printmesh_ledger::{Amount, PaymentLedger, PrincipalId};
use tracing::{debug, warn};

use crate::error::{MarketError, Result};

/// Holds and releases escrowed funds through an external ledger.
///
/// Release is not tracked per order. Callers delete the order record after
/// a successful release, which is what makes each release happen once.
pub struct ValueCustodian {
    ledger: Arc<dyn PaymentLedger>,
    account: PrincipalId,
    held: Amount,
}

impl ValueCustodian {
    /// Creates a custodian that escrows into `account` on `ledger`.
    #[must_use]
    pub fn new(ledger: Arc<dyn PaymentLedger>, account: PrincipalId) -> Self {
        Self {
            ledger,
            account,
            held: Amount::ZERO,
        }
    }

    /// The custody account payers must approve.
    #[must_use]
    pub fn account(&self) -> &PrincipalId {
        &self.account
    }

    /// Total value currently held on behalf of live orders.
    #[must_use]
    pub fn total_held(&self) -> Amount {
        self.held
    }

    /// Pulls `amount` from `payer` into custody.
    ///
    /// # Errors
    ///
    /// [`MarketError::InsufficientFunds`] if the payer's balance is short,
    /// [`MarketError::NotApproved`] if the custody account's allowance is
    /// short, [`MarketError::TransferFailed`] if the ledger rejects the move.
    pub fn lock(&mut self, payer: &PrincipalId, amount: Amount) -> Result<()> {
        let held = self
            .held
            .checked_add(amount)
            .ok_or_else(|| MarketError::TransferFailed("custody total overflow".into()))?;

        let available = self.ledger.balance(payer)?;
        if available < amount {
            warn!(payer = %payer, required = %amount, available = %available, "lock rejected");
            return Err(MarketError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        let approved = self.ledger.allowance(payer, &self.account)?;
        if approved < amount {
            warn!(payer = %payer, required = %amount, approved = %approved, "lock rejected");
            return Err(MarketError::NotApproved {
                required: amount,
                approved,
            });
        }

        self.ledger
            .transfer_from(&self.account, payer, &self.account, amount)
            .inspect_err(|e| warn!(payer = %payer, error = %e, "lock transfer failed"))?;

        self.held = held;
        debug!(payer = %payer, amount = %amount, held = %self.held, "funds locked");
        Ok(())
    }

    /// Pays `amount` out of custody to `payee`.
    ///
    /// # Errors
    ///
    /// [`MarketError::TransferFailed`] if the ledger rejects the move or
    /// custody holds less than `amount`.
    pub fn release(&mut self, payee: &PrincipalId, amount: Amount) -> Result<()> {
        let held = self.held.checked_sub(amount).ok_or_else(|| {
            MarketError::TransferFailed(format!("custody holds {}, cannot release {amount}", self.held))
        })?;

        self.ledger
            .transfer(&self.account, payee, amount)
            .map_err(|e| {
                warn!(payee = %payee, error = %e, "release transfer failed");
                MarketError::TransferFailed(e.to_string())
            })?;

        self.held = held;
        debug!(payee = %payee, amount = %amount, held = %self.held, "funds released");
        Ok(())
    }
}

impl fmt::Debug for ValueCustodian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCustodian")
            .field("account", &self.account)
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}
