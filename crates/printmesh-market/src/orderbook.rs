//! Order storage and per-provider indices.
//!
//! Orders live in a keyed store; each provider additionally owns an ordered
//! list of order ids. Nothing holds a reference into another record, so a
//! deletion only has to touch the store and the one index that names the id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use printmesh_ledger::{Amount, PrincipalId};
use tracing::debug;

use crate::order::{Order, OrderId};

/// The authoritative store of live orders.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: HashMap<OrderId, Order>,
    by_provider: HashMap<PrincipalId, Vec<OrderId>>,
}

impl OrderBook {
    /// Creates an empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live order has this id.
    #[must_use]
    pub fn contains(&self, id: &OrderId) -> bool {
        self.orders.contains_key(id)
    }

    /// Inserts an order and appends it to its provider's index.
    ///
    /// The caller checks that the id is free.
    pub fn insert(&mut self, order: Order) {
        self.by_provider
            .entry(order.provider.clone())
            .or_default()
            .push(order.id.clone());
        self.orders.insert(order.id.clone(), order);
    }

    /// Gets an order by ID.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Gets a mutable order by ID.
    pub fn get_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        self.orders.get_mut(id)
    }

    /// Deletes an order from the store and from its provider's index.
    pub fn remove(&mut self, id: &OrderId) -> Option<Order> {
        let order = self.orders.remove(id)?;
        if let Some(index) = self.by_provider.get_mut(&order.provider) {
            index.retain(|entry| entry != id);
        }
        Some(order)
    }

    /// Drops finished and lapsed entries from `provider`'s index.
    ///
    /// An entry goes if its order was completed by the provider, or is still
    /// unsigned at or after its expiration time. Survivors keep their
    /// relative order. Records stay in the store: lapsed orders remain
    /// refundable and completed ones remain payable.
    pub fn sweep_expired(&mut self, provider: &PrincipalId, now: DateTime<Utc>) -> Vec<OrderId> {
        let Some(index) = self.by_provider.get_mut(provider) else {
            return Vec::new();
        };

        let orders = &self.orders;
        let mut swept = Vec::new();
        index.retain(|id| {
            let keep = orders
                .get(id)
                .is_some_and(|o| !o.completed_by_provider && !o.is_expired_unsigned(now));
            if !keep {
                swept.push(id.clone());
            }
            keep
        });

        if !swept.is_empty() {
            debug!(provider = %provider, count = swept.len(), "swept provider index");
        }
        swept
    }

    /// Ids in `provider`'s index, oldest first.
    #[must_use]
    pub fn provider_index(&self, provider: &PrincipalId) -> &[OrderId] {
        self.by_provider.get(provider).map_or(&[], Vec::as_slice)
    }

    /// Signed, not yet completed orders in `provider`'s index, in index order.
    #[must_use]
    pub fn active_orders(&self, provider: &PrincipalId) -> Vec<&Order> {
        self.indexed(provider).filter(|o| o.is_active()).collect()
    }

    /// Orders placed by `customer` that are still indexed by their provider.
    ///
    /// Providers are walked in the given order. An order that has been swept
    /// from its provider's index is not returned even though its record may
    /// still exist.
    pub fn orders_for_customer<'a>(
        &'a self,
        customer: &PrincipalId,
        providers: impl Iterator<Item = &'a PrincipalId>,
    ) -> Vec<&'a Order> {
        providers
            .flat_map(|provider| self.indexed(provider))
            .filter(|o| &o.customer == customer)
            .collect()
    }

    /// Sum of escrowed prices over every live order.
    #[must_use]
    pub fn escrowed_total(&self) -> Amount {
        self.orders.values().map(|o| o.initial_price).sum()
    }

    /// Number of live orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether there are no live orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn indexed<'a>(&'a self, provider: &PrincipalId) -> impl Iterator<Item = &'a Order> + 'a {
        self.provider_index(provider)
            .iter()
            .filter_map(|id| self.orders.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::fixtures::{epoch, order, signed};
    use chrono::Duration;

    fn ids(orders: &[&Order]) -> Vec<String> {
        orders.iter().map(|o| o.id.to_string()).collect()
    }

    #[test]
    fn insert_indexes_by_provider() {
        let mut book = OrderBook::new();
        book.insert(order("a", "p1", "c", 10, 10));
        book.insert(order("b", "p2", "c", 10, 10));
        book.insert(order("c", "p1", "c", 10, 10));

        let p1 = PrincipalId::new("p1");
        assert_eq!(book.provider_index(&p1), [OrderId::new("a"), OrderId::new("c")]);
        assert_eq!(book.len(), 3);
        assert!(book.contains(&OrderId::new("b")));
    }

    #[test]
    fn remove_clears_store_and_index() {
        let mut book = OrderBook::new();
        book.insert(order("a", "p1", "c", 10, 10));
        book.insert(order("b", "p1", "c", 10, 10));

        let removed = book.remove(&OrderId::new("a"));
        assert!(removed.is_some());
        assert!(!book.contains(&OrderId::new("a")));
        assert_eq!(book.provider_index(&PrincipalId::new("p1")), [OrderId::new("b")]);
        assert!(book.remove(&OrderId::new("a")).is_none());
    }

    #[test]
    fn sweep_drops_lapsed_unsigned_and_completed() {
        let mut book = OrderBook::new();
        book.insert(order("lapsed", "p", "c", 10, 10));
        book.insert(signed(order("signed", "p", "c", 10, 10)));
        let mut done = signed(order("done", "p", "c", 10, 10));
        done.start_time = Some(epoch());
        done.completed_by_provider = true;
        book.insert(done);
        let mut fresh = order("fresh", "p", "c", 10, 10);
        fresh.expiration_time = epoch() + Duration::hours(1);
        book.insert(fresh);

        let provider = PrincipalId::new("p");
        let swept = book.sweep_expired(&provider, epoch() + Duration::minutes(5));

        assert_eq!(swept, [OrderId::new("lapsed"), OrderId::new("done")]);
        assert_eq!(
            book.provider_index(&provider),
            [OrderId::new("signed"), OrderId::new("fresh")]
        );
        // Records survive the sweep.
        assert!(book.contains(&OrderId::new("lapsed")));
        assert!(book.contains(&OrderId::new("done")));
    }

    #[test]
    fn sweep_before_expiry_keeps_everything() {
        let mut book = OrderBook::new();
        book.insert(order("a", "p", "c", 10, 10));
        let swept = book.sweep_expired(&PrincipalId::new("p"), epoch() + Duration::seconds(299));
        assert!(swept.is_empty());
        assert_eq!(book.provider_index(&PrincipalId::new("p")).len(), 1);
    }

    #[test]
    fn sweep_unknown_provider_is_noop() {
        let mut book = OrderBook::new();
        assert!(book.sweep_expired(&PrincipalId::new("ghost"), epoch()).is_empty());
    }

    #[test]
    fn active_orders_are_signed_and_incomplete() {
        let mut book = OrderBook::new();
        book.insert(order("unsigned", "p", "c", 10, 10));
        book.insert(signed(order("s1", "p", "c", 10, 10)));
        let mut done = signed(order("done", "p", "c", 10, 10));
        done.completed_by_provider = true;
        book.insert(done);
        book.insert(signed(order("s2", "p", "c", 10, 10)));

        let active = book.active_orders(&PrincipalId::new("p"));
        assert_eq!(ids(&active), ["s1", "s2"]);
    }

    #[test]
    fn customer_view_depends_on_provider_index() {
        let mut book = OrderBook::new();
        book.insert(order("a", "p1", "alice", 10, 10));
        book.insert(order("b", "p2", "bob", 10, 10));
        book.insert(order("c", "p2", "alice", 10, 10));

        let providers = [PrincipalId::new("p1"), PrincipalId::new("p2")];
        let alice = PrincipalId::new("alice");
        assert_eq!(ids(&book.orders_for_customer(&alice, providers.iter())), ["a", "c"]);

        book.sweep_expired(&PrincipalId::new("p1"), epoch() + Duration::minutes(10));
        assert_eq!(ids(&book.orders_for_customer(&alice, providers.iter())), ["c"]);
        assert!(book.contains(&OrderId::new("a")));
    }

    #[test]
    fn escrowed_total_sums_initial_prices() {
        let mut book = OrderBook::new();
        assert!(book.is_empty());
        book.insert(order("a", "p", "c", 10, 50));
        book.insert(order("b", "p", "c", 7, 7));
        assert_eq!(book.escrowed_total(), Amount::from_units(17));
    }
}
