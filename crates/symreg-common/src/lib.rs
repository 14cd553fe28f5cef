//! # Symreg Common
//!
//! Shared types and the caller-visible error taxonomy for the symreg
//! service: a metered, job-oriented symbolic-regression API where every
//! job is priced up front, gated on the caller's credit balance, and
//! settled against the ledger exactly once.
//!
//! ## Core Types
//!
//! - [`Account`]: per-user credit balance with available/held funds
//! - [`Transaction`]: append-only ledger entry (charge or top-up)
//! - [`Job`]/[`JobDescriptor`]/[`JobResult`]: a regression job and its outcome
//! - [`PriceQuote`]: ephemeral workload price, never persisted
//! - [`ServiceError`]: the classified failure surface exposed to callers

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ErrorKind, Result, ServiceError};
pub use types::{
    account::{Account, AccountError},
    job::{Artifact, Job, JobDescriptor, JobResult, JobStatus},
    pricing::PriceQuote,
    transaction::{Settlement, Transaction, TransactionStatus},
};

/// Symreg version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current UTC time in Unix milliseconds, the timestamp unit used
/// throughout the workspace.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
