//! # Symreg Runner
//!
//! Adapter between the orchestrator and the opaque formula-search engine.
//! One call runs one job to completion or classified failure:
//!
//! - input is parsed and validated before the engine sees it
//!   ([`dataset`]), so schema mismatches surface as `MalformedInput`
//! - the engine itself is a blocking black box ([`Engine`]) dispatched on
//!   tokio's blocking pool with an optional wall-clock timeout
//! - failures are contained and classified ([`RunFailure`]); a failed run
//!   never surfaces partial artifacts as a success

pub mod dataset;
pub mod engine;
pub mod runner;

pub use dataset::{Dataset, DatasetError};
pub use engine::{
    Engine, EngineOutput, EngineTask, DATA_FILENAME, DEFAULT_OP_NAMES, LOG_FILENAME,
    PARETO_FILENAME,
};
pub use runner::{JobRunner, RunFailure, RunResult};
