//! Pricing policy
//!
//! Pure function from a declared workload size to a price. No state, no
//! side effects: the quote for a given epoch budget is fully determined
//! by configuration.

use rust_decimal::{Decimal, RoundingStrategy};
use symreg_common::PriceQuote;
use thiserror::Error;

/// Default cap on the declared epoch budget
pub const DEFAULT_MAX_EPOCHS: u32 = 10_000;

/// Default number of decimal places in the ledger's smallest unit
pub const DEFAULT_SCALE: u32 = 4;

/// Pricing calculation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),
}

/// Configurable linear pricing: `base_price + epoch_price * epochs`
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    /// Flat price component
    base_price: Decimal,
    /// Price per declared epoch
    epoch_price: Decimal,
    /// Largest accepted epoch budget
    max_epochs: u32,
    /// Decimal places of the ledger's smallest unit
    scale: u32,
}

impl PricingPolicy {
    /// Create a policy with default epoch cap and rounding scale
    pub fn new(base_price: Decimal, epoch_price: Decimal) -> Self {
        Self {
            base_price,
            epoch_price,
            max_epochs: DEFAULT_MAX_EPOCHS,
            scale: DEFAULT_SCALE,
        }
    }

    /// Set the epoch budget cap
    pub fn with_max_epochs(mut self, max_epochs: u32) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    /// Set the rounding scale (decimal places)
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Largest accepted epoch budget
    pub fn max_epochs(&self) -> u32 {
        self.max_epochs
    }

    /// Quote a price for the declared epoch budget
    ///
    /// Deterministic and idempotent: identical input yields a
    /// byte-identical amount. Fails with `InvalidWorkload` when the budget
    /// is zero or exceeds the configured maximum.
    pub fn quote(&self, epochs: u32) -> Result<PriceQuote, PricingError> {
        if epochs == 0 {
            return Err(PricingError::InvalidWorkload(
                "epoch budget must be positive".to_string(),
            ));
        }
        if epochs > self.max_epochs {
            return Err(PricingError::InvalidWorkload(format!(
                "epoch budget {} exceeds maximum {}",
                epochs, self.max_epochs
            )));
        }

        let raw = self.base_price + self.epoch_price * Decimal::from(epochs);
        // Half-up to the ledger's smallest unit
        let amount = raw.round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero);

        Ok(PriceQuote {
            epochs,
            base_price: self.base_price,
            epoch_price: self.epoch_price,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_linear_quote() {
        let policy = PricingPolicy::new(dec!(5), dec!(1));
        let quote = policy.quote(50).unwrap();
        assert_eq!(quote.amount, dec!(55));
    }

    #[test]
    fn test_zero_epochs_rejected() {
        let policy = PricingPolicy::new(dec!(5), dec!(1));
        assert!(matches!(
            policy.quote(0),
            Err(PricingError::InvalidWorkload(_))
        ));
    }

    #[test]
    fn test_over_budget_rejected() {
        let policy = PricingPolicy::new(dec!(5), dec!(1)).with_max_epochs(100);
        assert!(policy.quote(100).is_ok());
        assert!(matches!(
            policy.quote(101),
            Err(PricingError::InvalidWorkload(_))
        ));
    }

    #[test]
    fn test_half_up_rounding() {
        // 0.1 + 0.00005 * 50 = 0.1025 -> 0.1025 stays at scale 4
        let policy = PricingPolicy::new(dec!(0.1), dec!(0.00005));
        assert_eq!(policy.quote(50).unwrap().amount, dec!(0.1025));

        // 0.00003 * 5 = 0.00015 -> rounds half-up to 0.0002
        let policy = PricingPolicy::new(Decimal::ZERO, dec!(0.00003));
        assert_eq!(policy.quote(5).unwrap().amount, dec!(0.0002));
    }

    #[test]
    fn test_quote_idempotent() {
        let policy = PricingPolicy::new(dec!(5), dec!(0.333));
        let a = policy.quote(77).unwrap();
        let b = policy.quote(77).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn quote_is_deterministic(epochs in 1u32..=DEFAULT_MAX_EPOCHS) {
            let policy = PricingPolicy::new(dec!(5), dec!(0.25));
            let a = policy.quote(epochs).unwrap();
            let b = policy.quote(epochs).unwrap();
            prop_assert_eq!(a.amount, b.amount);
        }

        #[test]
        fn quote_is_monotonic(epochs in 1u32..DEFAULT_MAX_EPOCHS) {
            let policy = PricingPolicy::new(dec!(5), dec!(0.25));
            let lower = policy.quote(epochs).unwrap();
            let higher = policy.quote(epochs + 1).unwrap();
            prop_assert!(higher.amount >= lower.amount);
        }

        #[test]
        fn quote_is_non_negative(epochs in 1u32..=DEFAULT_MAX_EPOCHS) {
            let policy = PricingPolicy::new(Decimal::ZERO, dec!(0.0001));
            let quote = policy.quote(epochs).unwrap();
            prop_assert!(quote.amount >= Decimal::ZERO);
        }
    }
}
