//! Ledger store
//!
//! Durable record of user balances plus an append-only transaction log.
//! The contract every backend must honor: a reservation is an atomic
//! check-and-hold, settlement is idempotent, and committed balances are
//! never negative.

pub mod memory;

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;
use symreg_common::{AccountError, Settlement, Transaction, TransactionStatus};
use uuid::Uuid;

pub use memory::InMemoryLedger;

/// Errors from ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(Uuid),

    #[error("Transaction {id} already settled as {status:?}")]
    SettlementConflict {
        id: Uuid,
        status: TransactionStatus,
    },

    #[error("Account error: {0}")]
    Account(#[from] AccountError),
}

/// Trait for ledger storage backends
///
/// All operations are scoped to a single user id; implementations must
/// serialize reserve/commit per user so that concurrent reservations can
/// never jointly overcommit funds.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current available balance; fails with `UnknownUser` if absent
    async fn balance(&self, user_id: Uuid) -> Result<Decimal, LedgerError>;

    /// Top up a user's balance, creating the account on first contact.
    /// Always succeeds for non-negative amounts; returns the new balance.
    async fn credit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<Decimal, LedgerError>;

    /// Atomically check the balance and hold `amount` for a job, recording
    /// a `Pending` debit. Fails with `InsufficientFunds` without touching
    /// the balance; that failure is terminal for the whole request.
    async fn reserve(
        &self,
        user_id: Uuid,
        amount: Decimal,
        job_id: Uuid,
        description: &str,
    ) -> Result<Uuid, LedgerError>;

    /// Finalize a reservation: `Charge` burns the held funds, `Release`
    /// returns them. Idempotent for a repeated identical settlement;
    /// a conflicting re-settlement fails with `SettlementConflict`.
    async fn commit(&self, tx_id: Uuid, settlement: Settlement) -> Result<(), LedgerError>;

    /// Fetch a single transaction
    async fn transaction(&self, tx_id: Uuid) -> Result<Transaction, LedgerError>;

    /// All transactions for a user, insertion order
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError>;

    /// Crash recovery: reverse `Pending` transactions older than the grace
    /// period, returning how many were reversed
    async fn sweep_stale(&self, grace: Duration) -> Result<usize, LedgerError>;
}
