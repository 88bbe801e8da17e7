//! Property tests for provider scheduling through the public facade.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use printmesh_ledger::{Amount, PrincipalId, SimulatedLedger};
use printmesh_market::{ManualClock, MarketConfig, OrderId, OrderRequest, PrintMarket};
use proptest::prelude::*;

fn market_with_orders(bids: &[(u64, u64)]) -> PrintMarket {
    let ledger = Arc::new(SimulatedLedger::new());
    let clock = Arc::new(ManualClock::new(DateTime::<Utc>::UNIX_EPOCH));
    let escrow = PrincipalId::new("escrow");
    let provider = PrincipalId::new("printer");
    let customer = PrincipalId::new("alice");

    ledger.mint(&customer, Amount::from_units(u64::MAX / 2));
    ledger.approve(&customer, &escrow, Amount::from_units(u64::MAX / 2));

    let market = PrintMarket::new(ledger, escrow, clock, MarketConfig::default()).expect("market");
    market.register_provider(provider.clone(), "fdm").expect("register");

    for (i, (price, extra)) in bids.iter().enumerate() {
        let id = OrderId::new(format!("o{i}"));
        market
            .create_order(
                OrderRequest::new(
                    id.clone(),
                    provider.clone(),
                    customer.clone(),
                    Amount::from_units(*price),
                    60,
                )
                .with_priority_bid(Amount::from_units(price + extra)),
            )
            .expect("create");
        market.sign_order(&id, &provider).expect("sign");
    }
    market
}

proptest! {
    #[test]
    fn execute_starts_first_highest_ratio(
        bids in prop::collection::vec((1u64..1_000, 0u64..5_000), 1..12)
    ) {
        let market = market_with_orders(&bids);
        let ratios: Vec<u64> = bids.iter().map(|(p, e)| (p + e) / p).collect();
        let best = ratios.iter().copied().max().unwrap_or_default();
        let expected = ratios.iter().position(|r| *r == best).unwrap_or_default();

        let provider = PrincipalId::new("printer");
        let expected = OrderId::new(format!("o{expected}"));
        prop_assert_eq!(market.next_order(&provider), Some(expected.clone()));
        prop_assert_eq!(market.execute(&provider).expect("execute"), expected);
    }

    #[test]
    fn escrow_equals_sum_of_prices(
        bids in prop::collection::vec((1u64..1_000, 0u64..5_000), 0..12)
    ) {
        let market = market_with_orders(&bids);
        let total: u64 = bids.iter().map(|(p, _)| p).sum();
        prop_assert_eq!(market.escrowed_total(), Amount::from_units(total));
        prop_assert_eq!(market.custody_held(), Amount::from_units(total));
    }
}
