//! # printmesh-ledger
//!
//! Value-transfer primitives for the printmesh marketplace.
//!
//! This crate provides:
//! - [`Amount`] and [`PrincipalId`] primitives
//! - The [`PaymentLedger`] trait the escrow engine talks to
//! - [`SimulatedLedger`], an in-memory ledger for development and tests
//!
//! ## Example
//!
//! ```rust
//! use printmesh_ledger::{Amount, PaymentLedger, PrincipalId, SimulatedLedger};
//!
//! # fn example() -> printmesh_ledger::Result<()> {
//! let ledger = SimulatedLedger::new();
//! let alice = PrincipalId::new("alice");
//! let bob = PrincipalId::new("bob");
//!
//! ledger.mint(&alice, Amount::from_units(100));
//! ledger.transfer(&alice, &bob, Amount::from_units(40))?;
//!
//! assert_eq!(ledger.balance(&bob)?, Amount::from_units(40));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod error;
pub mod ledger;
pub mod principal;
pub mod simulated;

pub use amount::Amount;
pub use error::{LedgerError, Result};
pub use ledger::PaymentLedger;
pub use principal::PrincipalId;
pub use simulated::SimulatedLedger;
