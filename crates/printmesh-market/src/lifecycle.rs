//! Order lifecycle guards and transitions.
//!
//! ```text
//! Created --sign--> Signed --start--> Executing --complete--> Completed
//!    |                                                          |
//!    +--(signing window lapses)--> refund         dispute <-----+----> payout
//! ```
//!
//! Each guard is a small predicate returning a typed error. Transitions
//! compose the guards they need and only mutate once all of them pass.
//! Nothing here touches escrow; the market applies custody effects after
//! [`check_refundable`] or [`check_payable`] succeed.

use chrono::{DateTime, Duration, Utc};
use printmesh_ledger::PrincipalId;

use crate::error::{MarketError, Result};
use crate::order::Order;

/// The caller must be the order's provider.
pub fn ensure_provider(order: &Order, caller: &PrincipalId) -> Result<()> {
    if &order.provider == caller {
        Ok(())
    } else {
        Err(MarketError::Unauthorized {
            caller: caller.clone(),
            role: "provider",
            order_id: order.id.clone(),
        })
    }
}

/// The caller must be the order's customer.
pub fn ensure_customer(order: &Order, caller: &PrincipalId) -> Result<()> {
    if &order.customer == caller {
        Ok(())
    } else {
        Err(MarketError::Unauthorized {
            caller: caller.clone(),
            role: "customer",
            order_id: order.id.clone(),
        })
    }
}

/// The order must be signed.
pub fn ensure_signed(order: &Order) -> Result<()> {
    state_check(order, order.signed, "not signed")
}

/// The order must not be signed.
pub fn ensure_unsigned(order: &Order) -> Result<()> {
    state_check(order, !order.signed, "already signed")
}

/// The order must have been started by the scheduler.
pub fn ensure_started(order: &Order) -> Result<()> {
    state_check(order, order.start_time.is_some(), "not started")
}

/// The provider must have marked the order completed.
pub fn ensure_completed(order: &Order) -> Result<()> {
    state_check(order, order.completed_by_provider, "not completed")
}

/// The provider must not have marked the order completed.
pub fn ensure_incomplete(order: &Order) -> Result<()> {
    state_check(order, !order.completed_by_provider, "already completed")
}

/// The customer must not have disputed the order.
pub fn ensure_undisputed(order: &Order) -> Result<()> {
    state_check(order, !order.disputed_by_customer, "disputed")
}

fn state_check(order: &Order, ok: bool, reason: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(MarketError::WrongState {
            order_id: order.id.clone(),
            reason,
        })
    }
}

fn before(
    order: &Order,
    now: DateTime<Utc>,
    deadline: DateTime<Utc>,
    window: &'static str,
) -> Result<()> {
    if now < deadline {
        Ok(())
    } else {
        Err(MarketError::Expired {
            order_id: order.id.clone(),
            window,
        })
    }
}

fn at_or_after(
    order: &Order,
    now: DateTime<Utc>,
    deadline: DateTime<Utc>,
    window: &'static str,
) -> Result<()> {
    if now >= deadline {
        Ok(())
    } else {
        Err(MarketError::NotYetExpired {
            order_id: order.id.clone(),
            window,
        })
    }
}

fn execution_deadline(order: &Order) -> Result<DateTime<Utc>> {
    order.execution_deadline().ok_or_else(|| MarketError::WrongState {
        order_id: order.id.clone(),
        reason: "not started",
    })
}

fn dispute_deadline(order: &Order, grace: Duration) -> Result<DateTime<Utc>> {
    order.dispute_deadline(grace).ok_or_else(|| MarketError::WrongState {
        order_id: order.id.clone(),
        reason: "not started",
    })
}

/// Provider signs an open order inside its signing window.
///
/// A closed window is reported before a repeated signature.
pub fn sign(order: &mut Order, caller: &PrincipalId, now: DateTime<Utc>) -> Result<()> {
    ensure_provider(order, caller)?;
    before(order, now, order.expiration_time, "signing")?;
    ensure_unsigned(order)?;
    order.signed = true;
    Ok(())
}

/// Scheduler starts (or restarts) a signed order.
pub fn start(order: &mut Order, now: DateTime<Utc>) -> Result<()> {
    ensure_signed(order)?;
    ensure_incomplete(order)?;
    order.start_time = Some(now);
    Ok(())
}

/// Provider marks a started order done before its execution deadline.
pub fn complete(order: &mut Order, caller: &PrincipalId, now: DateTime<Utc>) -> Result<()> {
    ensure_provider(order, caller)?;
    ensure_signed(order)?;
    ensure_started(order)?;
    ensure_incomplete(order)?;
    before(order, now, execution_deadline(order)?, "execution")?;
    order.completed_by_provider = true;
    Ok(())
}

/// Customer disputes a completed order inside the grace window.
pub fn report_uncomplete(
    order: &mut Order,
    caller: &PrincipalId,
    now: DateTime<Utc>,
    grace: Duration,
) -> Result<()> {
    ensure_customer(order, caller)?;
    ensure_signed(order)?;
    ensure_completed(order)?;
    ensure_undisputed(order)?;
    before(order, now, dispute_deadline(order, grace)?, "dispute")?;
    order.disputed_by_customer = true;
    Ok(())
}

/// Whether the customer may take their escrow back.
pub fn check_refundable(order: &Order, caller: &PrincipalId, now: DateTime<Utc>) -> Result<()> {
    ensure_customer(order, caller)?;
    ensure_unsigned(order)?;
    at_or_after(order, now, order.expiration_time, "signing")
}

/// Whether the provider may claim the escrow.
pub fn check_payable(
    order: &Order,
    caller: &PrincipalId,
    now: DateTime<Utc>,
    grace: Duration,
) -> Result<()> {
    ensure_provider(order, caller)?;
    ensure_signed(order)?;
    ensure_completed(order)?;
    ensure_undisputed(order)?;
    at_or_after(order, now, dispute_deadline(order, grace)?, "dispute")
}
