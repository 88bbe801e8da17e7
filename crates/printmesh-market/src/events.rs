//! Journal of state changes.

use chrono::{DateTime, Utc};
use printmesh_ledger::{Amount, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::order::OrderId;

/// A successful state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A provider joined the marketplace.
    ProviderRegistered {
        /// The new provider.
        provider: PrincipalId,
    },
    /// A customer opened an order and escrowed its price.
    OrderCreated {
        /// The new order.
        order_id: OrderId,
        /// Provider that will run it.
        provider: PrincipalId,
        /// Customer that paid.
        customer: PrincipalId,
        /// Escrowed amount.
        amount: Amount,
    },
    /// Lapsed or completed entries were dropped from a provider's index.
    OrdersSwept {
        /// Provider whose index was compacted.
        provider: PrincipalId,
        /// The dropped ids, in former index order.
        order_ids: Vec<OrderId>,
    },
    /// The provider accepted the order.
    OrderSigned {
        /// The signed order.
        order_id: OrderId,
    },
    /// The scheduler started the order.
    OrderStarted {
        /// The started order.
        order_id: OrderId,
        /// Its priority factor at selection time.
        priority: u64,
        /// Whether it had been started before.
        restarted: bool,
    },
    /// The provider reported the job done.
    OrderCompleted {
        /// The completed order.
        order_id: OrderId,
    },
    /// The customer disputed completion.
    OrderDisputed {
        /// The disputed order.
        order_id: OrderId,
    },
    /// Escrow went back to the customer and the order was deleted.
    OrderRefunded {
        /// The deleted order.
        order_id: OrderId,
        /// Refunded amount.
        amount: Amount,
    },
    /// Escrow went to the provider and the order was deleted.
    OrderPaidOut {
        /// The deleted order.
        order_id: OrderId,
        /// Paid amount.
        amount: Amount,
    },
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Clock reading of the operation that produced the event.
    pub at: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = MarketEvent {
            at: DateTime::<Utc>::UNIX_EPOCH,
            kind: EventKind::OrderSigned {
                order_id: OrderId::new("o1"),
            },
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "order_signed");
        assert_eq!(json["order_id"], "o1");

        let back: MarketEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, event);
    }
}
