//! Pricing types - amount = base_price + epoch_price * epochs
//!
//! A quote is ephemeral: it is computed per request, never persisted, and
//! re-quoting the same workload yields a byte-identical amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The price computed for a declared workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Declared epoch budget
    pub epochs: u32,

    /// Flat component of the price
    pub base_price: Decimal,

    /// Per-epoch component of the price
    pub epoch_price: Decimal,

    /// Final amount, rounded to the ledger's smallest unit
    pub amount: Decimal,
}

impl std::fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} for {} epochs", self.amount, self.epochs)
    }
}
