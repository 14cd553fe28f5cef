//! Core domain types shared across the workspace

pub mod account;
pub mod job;
pub mod pricing;
pub mod transaction;
