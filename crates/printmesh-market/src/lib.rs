//! # printmesh-market
//!
//! Order escrow and priority scheduling for a two-sided print marketplace.
//!
//! This crate provides:
//!
//! - Value custody over an external [`PaymentLedger`](printmesh_ledger::PaymentLedger)
//! - A provider registry and an order book with per-provider indices
//! - Priority selection of the next job a provider runs
//! - Lifecycle guards for signing, execution, disputes, refunds and payouts
//!
//! ## Lifecycle
//!
//! A customer opens an order and its price is escrowed. The provider signs
//! it within the signing window, then calls [`PrintMarket::execute`], which
//! starts the signed order with the highest `current_price / initial_price`
//! ratio. The provider completes it within its duration; the customer may
//! dispute during the grace window that follows; after that, an undisputed
//! order pays out to the provider. An order nobody signed in time can be
//! refunded to the customer instead.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::{DateTime, Duration, Utc};
//! use printmesh_ledger::{Amount, PrincipalId, SimulatedLedger};
//! use printmesh_market::{ManualClock, MarketConfig, OrderId, OrderRequest, PrintMarket};
//!
//! # fn example() -> printmesh_market::Result<()> {
//! let ledger = Arc::new(SimulatedLedger::new());
//! let clock = Arc::new(ManualClock::new(DateTime::<Utc>::UNIX_EPOCH));
//! let escrow = PrincipalId::new("escrow");
//! let market = PrintMarket::new(ledger.clone(), escrow.clone(), clock.clone(), MarketConfig::default())?;
//!
//! let printer = PrincipalId::new("printer");
//! let alice = PrincipalId::new("alice");
//! ledger.mint(&alice, Amount::from_units(500));
//! ledger.approve(&alice, &escrow, Amount::from_units(500));
//!
//! market.register_provider(printer.clone(), "FDM, 0.4mm nozzle")?;
//! market.create_order(OrderRequest::new("bracket", printer.clone(), alice.clone(), Amount::from_units(120), 3_600))?;
//! market.sign_order(&OrderId::new("bracket"), &printer)?;
//!
//! let running = market.execute(&printer)?;
//! market.complete_order(&running, &printer)?;
//!
//! clock.advance(Duration::hours(2));
//! assert_eq!(market.payout(&running, &printer)?, Amount::from_units(120));
//! # Ok(())
//! # }
//! # example().expect("example runs");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod custodian;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod market;
pub mod order;
pub mod orderbook;
pub mod registry;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MarketConfig;
pub use custodian::ValueCustodian;
pub use error::{MarketError, Result};
pub use events::{EventKind, MarketEvent};
pub use market::PrintMarket;
pub use order::{Order, OrderId, OrderPhase, OrderRequest};
pub use orderbook::OrderBook;
pub use registry::{Provider, ProviderRegistry};
pub use scheduler::{priority_factor, select_next, SelectionPolicy};
