//! # Symreg Billing
//!
//! Pricing policy and credit ledger for the symreg service.
//!
//! ## Pricing Formula
//!
//! ```text
//! amount = base_price + epoch_price * epochs
//! ```
//!
//! rounded half-up to the ledger's smallest unit, so repeated quoting of
//! the same workload is byte-identical.
//!
//! ## Ledger
//!
//! [`LedgerStore`] is the single source of truth for user balances: a
//! reservation atomically moves funds into a held bucket, and settlement
//! either burns the hold (charge) or returns it (release). No two
//! concurrent reservations for one user can jointly overcommit funds.

pub mod ledger;
pub mod pricing;

pub use ledger::{InMemoryLedger, LedgerError, LedgerStore};
pub use pricing::{PricingError, PricingPolicy};
