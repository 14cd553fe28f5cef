//! Service configuration

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pricing configuration
    pub pricing: PricingSettings,
    /// Billing policy configuration
    pub billing: BillingSettings,
    /// Runner configuration
    pub runner: RunnerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pricing: PricingSettings::default(),
            billing: BillingSettings::default(),
            runner: RunnerSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("SYMREG_BASE_PRICE") {
            if let Ok(v) = val.parse() {
                cfg.pricing.base_price = v;
            }
        }
        if let Ok(val) = std::env::var("SYMREG_EPOCH_PRICE") {
            if let Ok(v) = val.parse() {
                cfg.pricing.epoch_price = v;
            }
        }
        if let Ok(val) = std::env::var("SYMREG_MAX_EPOCHS") {
            if let Ok(v) = val.parse() {
                cfg.pricing.max_epochs = v;
            }
        }
        if let Ok(val) = std::env::var("SYMREG_PRICE_SCALE") {
            if let Ok(v) = val.parse() {
                cfg.pricing.scale = v;
            }
        }

        if let Ok(val) = std::env::var("SYMREG_CHARGE_ENGINE_FAILURES") {
            if let Ok(v) = val.parse() {
                cfg.billing.charge_engine_failures = v;
            }
        }
        if let Ok(val) = std::env::var("SYMREG_RESERVATION_GRACE_SECS") {
            if let Ok(v) = val.parse() {
                cfg.billing.reservation_grace_secs = v;
            }
        }

        if let Ok(val) = std::env::var("SYMREG_RUN_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                cfg.runner.run_timeout_secs = Some(v);
            }
        }

        Ok(cfg)
    }
}

/// Pricing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Flat price per job
    pub base_price: Decimal,
    /// Price per declared epoch
    pub epoch_price: Decimal,
    /// Largest accepted epoch budget
    pub max_epochs: u32,
    /// Decimal places of the ledger's smallest unit
    pub scale: u32,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            base_price: Decimal::new(5, 0),
            epoch_price: Decimal::ONE,
            max_epochs: symreg_billing::pricing::DEFAULT_MAX_EPOCHS,
            scale: symreg_billing::pricing::DEFAULT_SCALE,
        }
    }
}

/// Billing policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Whether engine faults and timeouts after work began keep the
    /// charge. Malformed input is always reversed regardless.
    pub charge_engine_failures: bool,
    /// Age after which an unsettled reservation is considered orphaned
    pub reservation_grace_secs: u64,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            charge_engine_failures: true,
            reservation_grace_secs: 15 * 60,
        }
    }
}

/// Runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Wall-clock limit per run; unlimited when absent
    pub run_timeout_secs: Option<u64>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            run_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.pricing.base_price, dec!(5));
        assert_eq!(cfg.pricing.epoch_price, dec!(1));
        assert!(cfg.billing.charge_engine_failures);
        assert!(cfg.runner.run_timeout_secs.is_none());
    }
}
