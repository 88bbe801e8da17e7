//! Priority selection among a provider's active orders.
//!
//! Priority is the integer ratio `current_price / initial_price`. The
//! highest ratio runs next; on a tie the order seen first wins, so the
//! provider index order (creation order) breaks ties.

use crate::order::{Order, OrderId};

/// Which active orders may be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Whether orders that were already started stay eligible.
    pub include_started: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            include_started: true,
        }
    }
}

/// Urgency factor of an order, truncated toward zero.
#[must_use]
pub fn priority_factor(order: &Order) -> u64 {
    order
        .current_price
        .units()
        .checked_div(order.initial_price.units())
        .unwrap_or(0)
}

/// Picks the next order to run from `active`, without mutating anything.
///
/// Returns `None` if nothing is eligible.
#[must_use]
pub fn select_next<'a, I>(active: I, policy: SelectionPolicy) -> Option<&'a OrderId>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut best: Option<(&Order, u64)> = None;
    for order in active {
        if !order.is_active() || (!policy.include_started && order.start_time.is_some()) {
            continue;
        }
        let factor = priority_factor(order);
        if best.is_none_or(|(_, top)| factor > top) {
            best = Some((order, factor));
        }
    }
    best.map(|(order, _)| &order.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::fixtures::{epoch, order, signed};
    use test_case::test_case;

    fn active(specs: &[(&str, u64, u64)]) -> Vec<Order> {
        specs
            .iter()
            .map(|&(id, price, bid)| signed(order(id, "p", "c", price, bid)))
            .collect()
    }

    #[test_case(10, 10 => 1 ; "equal prices")]
    #[test_case(10, 19 => 1 ; "fraction truncates")]
    #[test_case(10, 20 => 2 ; "double bid")]
    #[test_case(3, 10 => 3 ; "uneven ratio floors")]
    fn factor_is_floor_ratio(price: u64, bid: u64) -> u64 {
        priority_factor(&order("o", "p", "c", price, bid))
    }

    #[test]
    fn higher_ratio_wins() {
        let orders = active(&[("low", 10, 10), ("high", 10, 20)]);
        assert_eq!(
            select_next(&orders, SelectionPolicy::default()).map(OrderId::as_str),
            Some("high")
        );
    }

    #[test]
    fn first_seen_wins_ties() {
        let orders = active(&[("first", 10, 20), ("second", 5, 10), ("third", 1, 1)]);
        assert_eq!(
            select_next(&orders, SelectionPolicy::default()).map(OrderId::as_str),
            Some("first")
        );
    }

    #[test]
    fn truncated_ratios_tie() {
        // 1.9 and 1.0 both floor to 1.
        let orders = active(&[("a", 10, 10), ("b", 10, 19)]);
        assert_eq!(
            select_next(&orders, SelectionPolicy::default()).map(OrderId::as_str),
            Some("a")
        );
    }

    #[test]
    fn empty_set_selects_nothing() {
        let orders: Vec<Order> = Vec::new();
        assert!(select_next(&orders, SelectionPolicy::default()).is_none());
    }

    #[test]
    fn inactive_orders_are_skipped() {
        let mut orders = active(&[("done", 10, 50), ("next", 10, 10)]);
        orders[0].completed_by_provider = true;
        orders.push(order("unsigned", "p", "c", 1, 100));
        assert_eq!(
            select_next(&orders, SelectionPolicy::default()).map(OrderId::as_str),
            Some("next")
        );
    }

    #[test]
    fn started_orders_follow_policy() {
        let mut orders = active(&[("running", 10, 30), ("waiting", 10, 10)]);
        orders[0].start_time = Some(epoch());

        let reselect = SelectionPolicy::default();
        assert_eq!(select_next(&orders, reselect).map(OrderId::as_str), Some("running"));

        let skip = SelectionPolicy {
            include_started: false,
        };
        assert_eq!(select_next(&orders, skip).map(OrderId::as_str), Some("waiting"));
    }
}
