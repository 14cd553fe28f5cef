//! # Symreg Orchestrator
//!
//! The billing-gated core of the service: the sequence that prices a
//! declared workload, reserves the caller's funds, runs the engine exactly
//! once, and settles ledger and registry state atomically with the
//! outcome.
//!
//! ## Request state machine
//!
//! ```text
//! Received -> Quoted -> Reserved -> Running -> Settled
//!      \         \          \           \
//!       +---------+----------+-> Rejected +-> Failed
//! ```
//!
//! Money never moves for a job that did not run, and a job never runs
//! without a reserved charge. Each request produces exactly one terminal
//! transaction status and one terminal job status.

pub mod config;
pub mod orchestrator;
pub mod request;

pub use config::{BillingSettings, Config, PricingSettings, RunnerSettings};
pub use orchestrator::Orchestrator;
pub use request::{JobRequest, JobResponse};

// Re-export the caller-visible error surface
pub use symreg_common::{ErrorKind, Result, ServiceError};
