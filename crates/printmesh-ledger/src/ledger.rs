//! The payment ledger seam.
//!
//! The marketplace never holds balances itself. Every value movement goes
//! through an implementation of [`PaymentLedger`], which may be a remote
//! chain, a bank integration, or [`SimulatedLedger`](crate::SimulatedLedger).

use crate::amount::Amount;
use crate::error::Result;
use crate::principal::PrincipalId;

/// An external value-transfer service.
///
/// Calls are blocking and may fail. A failed call must leave the ledger
/// unchanged.
pub trait PaymentLedger: Send + Sync {
    /// Current balance held by `account`.
    fn balance(&self, account: &PrincipalId) -> Result<Amount>;

    /// Amount `owner` has pre-authorized `spender` to move on its behalf.
    fn allowance(&self, owner: &PrincipalId, spender: &PrincipalId) -> Result<Amount>;

    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: &PrincipalId, to: &PrincipalId, amount: Amount) -> Result<()>;

    /// Move `amount` from `owner` to `to` under `spender`'s allowance,
    /// consuming that much of the allowance.
    fn transfer_from(
        &self,
        spender: &PrincipalId,
        owner: &PrincipalId,
        to: &PrincipalId,
        amount: Amount,
    ) -> Result<()>;
}
