//! Error types for printmesh-market.

use printmesh_ledger::{Amount, LedgerError, PrincipalId};
use thiserror::Error;

use crate::order::OrderId;

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in marketplace operations.
///
/// Every guard runs before any mutation, so an error always means the
/// marketplace state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// A provider or order with this id already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// What kind of record collided.
        kind: &'static str,
        /// The duplicate id.
        id: String,
    },

    /// No provider or order with this id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What kind of record was looked up.
        kind: &'static str,
        /// The missing id.
        id: String,
    },

    /// The caller is not the party this operation belongs to.
    #[error("{caller} is not the {role} of order {order_id}")]
    Unauthorized {
        /// The calling principal.
        caller: PrincipalId,
        /// The role the caller needed to hold.
        role: &'static str,
        /// The order being operated on.
        order_id: OrderId,
    },

    /// A non-positive price or duration, or a priority bid below the price.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the bad argument.
        reason: String,
    },

    /// The time window for this operation has closed.
    #[error("{window} window closed for order {order_id}")]
    Expired {
        /// The order being operated on.
        order_id: OrderId,
        /// Which window closed.
        window: &'static str,
    },

    /// The operation may only run once a window has closed.
    #[error("{window} window still open for order {order_id}")]
    NotYetExpired {
        /// The order being operated on.
        order_id: OrderId,
        /// Which window is still open.
        window: &'static str,
    },

    /// The order is not in the state this operation requires.
    #[error("order {order_id} is in the wrong state: {reason}")]
    WrongState {
        /// The order being operated on.
        order_id: OrderId,
        /// What was wrong.
        reason: &'static str,
    },

    /// The provider has nothing signed and waiting.
    #[error("no active orders for provider {provider}")]
    NoActiveOrders {
        /// The provider that asked for work.
        provider: PrincipalId,
    },

    /// The payer's balance is too low.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently available.
        available: Amount,
    },

    /// The payer has not approved the custodian for enough value.
    #[error("custodian not approved: required {required}, approved {approved}")]
    NotApproved {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently approved.
        approved: Amount,
    },

    /// The payment ledger rejected a transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MarketError {
    pub(crate) fn order_not_found(id: &OrderId) -> Self {
        Self::NotFound {
            kind: "order",
            id: id.to_string(),
        }
    }

    pub(crate) fn provider_not_found(id: &PrincipalId) -> Self {
        Self::NotFound {
            kind: "provider",
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<LedgerError> for MarketError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            LedgerError::InsufficientAllowance {
                required,
                allowance,
            } => Self::NotApproved {
                required,
                approved: allowance,
            },
            LedgerError::TransferFailed { reason } => Self::TransferFailed(reason),
        }
    }
}
