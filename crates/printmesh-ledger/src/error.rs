//! Error types for ledger operations.

use thiserror::Error;

use crate::amount::Amount;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by a [`PaymentLedger`](crate::PaymentLedger).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The source account does not hold enough value.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        /// Amount the operation needs.
        required: Amount,
        /// Amount the account currently holds.
        available: Amount,
    },

    /// The spender has not been approved for enough value.
    #[error("insufficient allowance: approved {allowance}, need {required}")]
    InsufficientAllowance {
        /// Amount the operation needs.
        required: Amount,
        /// Amount currently approved.
        allowance: Amount,
    },

    /// The transfer was rejected by the ledger.
    #[error("transfer failed: {reason}")]
    TransferFailed {
        /// Reason for failure.
        reason: String,
    },
}

impl LedgerError {
    /// Create a transfer failed error.
    #[must_use]
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(
        LedgerError::InsufficientBalance {
            required: Amount::from_units(10),
            available: Amount::from_units(5),
        } => "insufficient balance: have 5, need 10" ; "balance"
    )]
    #[test_case(
        LedgerError::InsufficientAllowance {
            required: Amount::from_units(10),
            allowance: Amount::ZERO,
        } => "insufficient allowance: approved 0, need 10" ; "allowance"
    )]
    #[test_case(
        LedgerError::transfer_failed("node unreachable")
            => "transfer failed: node unreachable" ; "transfer"
    )]
    fn display(err: LedgerError) -> String {
        err.to_string()
    }
}
