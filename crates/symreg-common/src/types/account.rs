//! Account - per-user credit balance
//!
//! Credits pay for regression jobs. Key characteristics:
//! - Tracks available vs held balance (a hold backs a pending reservation)
//! - A hold is an atomic floor-checked move, so committed state can never
//!   go negative
//! - Version field increments on every mutation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Account operation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountError {
    #[error("Insufficient available balance: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Insufficient held balance: required {required}, held {held}")]
    InsufficientHeld { required: Decimal, held: Decimal },

    #[error("Amount must not be negative")]
    InvalidAmount,
}

/// Per-user credit balance
///
/// Funds move `available -> held` when a job is reserved, then either leave
/// the account (`settle_charge`) or return (`settle_release`) when the job
/// settles. Invariant: neither bucket is ever negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Owning user id
    pub user_id: Uuid,

    /// Spendable balance
    pub available: Decimal,

    /// Balance held for pending reservations
    pub held: Decimal,

    /// Version for optimistic concurrency control
    pub version: u64,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Timestamp of last modification
    pub updated_at: i64,
}

impl Account {
    /// Create a new empty account for a user
    pub fn new(user_id: Uuid) -> Self {
        let now = crate::now_millis();
        Self {
            user_id,
            available: Decimal::ZERO,
            held: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an account with an initial balance
    pub fn with_balance(user_id: Uuid, initial_balance: Decimal) -> Self {
        let mut account = Self::new(user_id);
        account.available = initial_balance;
        account
    }

    /// Total balance (available + held)
    #[inline]
    pub fn total(&self) -> Decimal {
        self.available + self.held
    }

    /// Credit the account (top-up). Zero is a no-op that still succeeds.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::InvalidAmount);
        }

        self.available += amount;
        self.touch();
        Ok(())
    }

    /// Hold funds for a reservation
    ///
    /// Moves funds from available to held. The check and the move happen on
    /// the same `&mut self`, so callers that serialize access per account
    /// get an atomic check-and-decrement.
    pub fn hold(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::InvalidAmount);
        }

        if self.available < amount {
            return Err(AccountError::InsufficientFunds {
                required: amount,
                available: self.available,
            });
        }

        self.available -= amount;
        self.held += amount;
        self.touch();
        Ok(())
    }

    /// Settle a held amount as a charge: the funds leave the account
    pub fn settle_charge(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::InvalidAmount);
        }

        if self.held < amount {
            return Err(AccountError::InsufficientHeld {
                required: amount,
                held: self.held,
            });
        }

        self.held -= amount;
        self.touch();
        Ok(())
    }

    /// Settle a held amount as a reversal: the funds return to available
    pub fn settle_release(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::InvalidAmount);
        }

        if self.held < amount {
            return Err(AccountError::InsufficientHeld {
                required: amount,
                held: self.held,
            });
        }

        self.held -= amount;
        self.available += amount;
        self.touch();
        Ok(())
    }

    /// Update version and timestamp
    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = crate::now_millis();
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Account(user={}, available={}, held={})",
            self.user_id, self.available, self.held
        )
    }
}
