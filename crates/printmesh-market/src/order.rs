//! Order records and the request used to open one.

use chrono::{DateTime, Duration, Utc};
use printmesh_ledger::{Amount, PrincipalId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique order identifier.
///
/// Unique among live orders only. Once an order is deleted its id may be
/// used again.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create from a caller-chosen string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random order ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("order-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Where an order sits in its lifecycle, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPhase {
    /// Funds locked, waiting for the provider's signature.
    Created,
    /// Signed and waiting to be scheduled.
    Signed,
    /// Selected by the scheduler; the execution timer is running.
    Executing,
    /// The provider has marked the job done.
    Completed,
    /// The customer flagged the job as not actually completed.
    Disputed,
}

impl fmt::Display for OrderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Signed => write!(f, "signed"),
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Disputed => write!(f, "disputed"),
        }
    }
}

/// Parameters for opening a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Caller-chosen order id.
    pub id: OrderId,
    /// The provider expected to run the job.
    pub provider: PrincipalId,
    /// The paying customer.
    pub customer: PrincipalId,
    /// Price locked in escrow.
    pub price: Amount,
    /// Time the provider has to complete the job once started, in seconds.
    pub duration_secs: u64,
    /// Optional urgency bid. Ranks the order as if it paid this much;
    /// only `price` is escrowed.
    #[serde(default)]
    pub priority_bid: Option<Amount>,
}

impl OrderRequest {
    /// Creates a request with no priority bid.
    #[must_use]
    pub fn new(
        id: impl Into<OrderId>,
        provider: PrincipalId,
        customer: PrincipalId,
        price: Amount,
        duration_secs: u64,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            customer,
            price,
            duration_secs,
            priority_bid: None,
        }
    }

    /// Sets the priority bid.
    #[must_use]
    pub fn with_priority_bid(mut self, bid: Amount) -> Self {
        self.priority_bid = Some(bid);
        self
    }
}

/// A live order held by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order id.
    pub id: OrderId,
    /// Provider that runs the job and receives payout.
    pub provider: PrincipalId,
    /// Customer that paid and receives any refund.
    pub customer: PrincipalId,
    /// Amount held in escrow.
    pub initial_price: Amount,
    /// Price used for ranking. Never below `initial_price`.
    pub current_price: Amount,
    /// Execution allowance in seconds.
    pub duration_secs: u64,
    /// When the scheduler last started this order.
    pub start_time: Option<DateTime<Utc>>,
    /// Signing deadline.
    pub expiration_time: DateTime<Utc>,
    /// Whether the provider has signed.
    pub signed: bool,
    /// Whether the provider has marked the job done.
    pub completed_by_provider: bool,
    /// Whether the customer has disputed completion.
    pub disputed_by_customer: bool,
}

impl Order {
    /// Execution allowance as a duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        i64::try_from(self.duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Deadline for completion, once started.
    #[must_use]
    pub fn execution_deadline(&self) -> Option<DateTime<Utc>> {
        let start = self.start_time?;
        Some(
            start
                .checked_add_signed(self.duration())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// End of the dispute window, once started.
    #[must_use]
    pub fn dispute_deadline(&self, grace: Duration) -> Option<DateTime<Utc>> {
        let deadline = self.execution_deadline()?;
        Some(
            deadline
                .checked_add_signed(grace)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// Whether the order is eligible for scheduling.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.signed && !self.completed_by_provider
    }

    /// Whether the signing window has lapsed without a signature.
    #[must_use]
    pub fn is_expired_unsigned(&self, now: DateTime<Utc>) -> bool {
        !self.signed && now >= self.expiration_time
    }

    /// The lifecycle phase implied by the flags.
    #[must_use]
    pub const fn phase(&self) -> OrderPhase {
        if self.disputed_by_customer {
            OrderPhase::Disputed
        } else if self.completed_by_provider {
            OrderPhase::Completed
        } else if self.start_time.is_some() {
            OrderPhase::Executing
        } else if self.signed {
            OrderPhase::Signed
        } else {
            OrderPhase::Created
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{epoch, order, signed};
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
        assert!(OrderId::generate().as_str().starts_with("order-"));
    }

    #[test]
    fn phase_follows_flags() {
        let mut o = order("o1", "p", "c", 10, 10);
        assert_eq!(o.phase(), OrderPhase::Created);
        o.signed = true;
        assert_eq!(o.phase(), OrderPhase::Signed);
        o.start_time = Some(epoch());
        assert_eq!(o.phase(), OrderPhase::Executing);
        o.completed_by_provider = true;
        assert_eq!(o.phase(), OrderPhase::Completed);
        o.disputed_by_customer = true;
        assert_eq!(o.phase(), OrderPhase::Disputed);
    }

    #[test]
    fn deadlines_need_a_start_time() {
        let mut o = signed(order("o1", "p", "c", 10, 10));
        assert!(o.execution_deadline().is_none());

        o.start_time = Some(epoch());
        assert_eq!(o.execution_deadline(), Some(epoch() + Duration::minutes(10)));
        assert_eq!(
            o.dispute_deadline(Duration::minutes(5)),
            Some(epoch() + Duration::minutes(15))
        );
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let o = order("o1", "p", "c", 10, 10);
        assert!(!o.is_expired_unsigned(o.expiration_time - Duration::seconds(1)));
        assert!(o.is_expired_unsigned(o.expiration_time));
        assert!(!signed(o.clone()).is_expired_unsigned(o.expiration_time));
    }

    #[test]
    fn request_builder_sets_bid() {
        let req = OrderRequest::new(
            "o1",
            PrincipalId::new("p"),
            PrincipalId::new("c"),
            Amount::from_units(10),
            60,
        )
        .with_priority_bid(Amount::from_units(30));
        assert_eq!(req.priority_bid, Some(Amount::from_units(30)));
        assert_eq!(req.id.as_str(), "o1");
    }

    #[test]
    fn phase_display() {
        assert_eq!(OrderPhase::Executing.to_string(), "executing");
        assert_eq!(OrderPhase::Disputed.to_string(), "disputed");
    }
}
