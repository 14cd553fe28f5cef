//! Transaction - append-only ledger entries
//!
//! Every reservation creates a `Pending` debit; settling the job moves it to
//! `Committed` (the charge stands) or `Reversed` (the hold was returned).
//! Top-ups are recorded as already-committed credits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Funds are held, awaiting the job outcome
    Pending,
    /// The debit was finalized; funds left the account
    Committed,
    /// The hold was returned; no money changed hands
    Reversed,
}

impl TransactionStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// How a pending reservation is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// The job consumed billed resources: the debit stands
    Charge,
    /// No billable work occurred: return the held funds
    Release,
}

impl Settlement {
    /// The terminal transaction status this settlement produces
    pub fn terminal_status(&self) -> TransactionStatus {
        match self {
            Settlement::Charge => TransactionStatus::Committed,
            Settlement::Release => TransactionStatus::Reversed,
        }
    }
}

/// A single ledger entry
///
/// `amount` is signed: negative for job charges, positive for top-ups.
/// Jobs are referenced by id only, never embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id
    pub id: Uuid,

    /// Owning user id
    pub user_id: Uuid,

    /// Signed amount: negative = charge, positive = credit
    pub amount: Decimal,

    /// Human-readable description (e.g. "regression job <id> (50 epochs)")
    pub description: String,

    /// Back-reference to the job this charge pays for, if any
    pub job_id: Option<Uuid>,

    /// Lifecycle status
    pub status: TransactionStatus,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Settlement timestamp, set when status turns terminal
    pub settled_at: Option<i64>,
}

impl Transaction {
    /// Create a pending charge for a job. The stored amount is negated.
    pub fn charge(user_id: Uuid, amount: Decimal, job_id: Uuid, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount: -amount,
            description,
            job_id: Some(job_id),
            status: TransactionStatus::Pending,
            created_at: crate::now_millis(),
            settled_at: None,
        }
    }

    /// Create an already-committed top-up credit
    pub fn top_up(user_id: Uuid, amount: Decimal, description: String) -> Self {
        let now = crate::now_millis();
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            description,
            job_id: None,
            status: TransactionStatus::Committed,
            created_at: now,
            settled_at: Some(now),
        }
    }

    /// The magnitude of the reserved debit
    pub fn held_amount(&self) -> Decimal {
        self.amount.abs()
    }

    /// Whether the transaction still awaits settlement
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}
