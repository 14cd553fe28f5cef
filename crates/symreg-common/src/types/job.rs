//! Job - a symbolic-regression run and its outcome
//!
//! A job is created `Queued` at request acceptance, turns `Running` when the
//! engine is invoked, and ends `Succeeded` or `Failed`. The registry owns
//! jobs exclusively; transactions reference them by id.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// What the caller asked the engine to do
///
/// `input_data` is delimited rows with a header line; `y_name` names the
/// target column and `x_names` the feature columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Raw tabular input (delimited rows with header)
    pub input_data: String,

    /// Target column name
    pub y_name: String,

    /// Feature column names
    pub x_names: Vec<String>,

    /// Declared epoch budget, used to size and price the job
    pub epochs: u32,

    /// Operations the search may use; engine defaults apply when empty
    pub op_names: Option<Vec<String>>,

    /// Free constant names, if any
    pub free_consts_names: Option<Vec<String>>,

    /// Named engine configuration preset
    pub run_config: String,

    /// Early-stop criterion (R²)
    pub stop_reward: f64,
}

impl JobDescriptor {
    /// Default engine configuration preset
    pub const DEFAULT_RUN_CONFIG: &'static str = "config0";

    /// Default early-stop R²
    pub const DEFAULT_STOP_REWARD: f64 = 0.999;

    /// Create a descriptor with default engine settings
    pub fn new(
        input_data: impl Into<String>,
        y_name: impl Into<String>,
        x_names: Vec<String>,
        epochs: u32,
    ) -> Self {
        Self {
            input_data: input_data.into(),
            y_name: y_name.into(),
            x_names,
            epochs,
            op_names: None,
            free_consts_names: None,
            run_config: Self::DEFAULT_RUN_CONFIG.to_string(),
            stop_reward: Self::DEFAULT_STOP_REWARD,
        }
    }

    /// Restrict the operation set
    pub fn with_op_names(mut self, op_names: Vec<String>) -> Self {
        self.op_names = Some(op_names);
        self
    }

    /// Declare free constants
    pub fn with_free_consts(mut self, names: Vec<String>) -> Self {
        self.free_consts_names = Some(names);
        self
    }

    /// Select an engine configuration preset
    pub fn with_run_config(mut self, run_config: impl Into<String>) -> Self {
        self.run_config = run_config.into();
        self
    }

    /// Set the early-stop criterion
    pub fn with_stop_reward(mut self, stop_reward: f64) -> Self {
        self.stop_reward = stop_reward;
        self
    }
}

/// Named file produced by a run (pareto table, data echo, run log)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub filename: String,
    pub content: String,
    pub content_type: String,
}

impl Artifact {
    /// CSV artifact
    pub fn csv(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: "text/csv".to_string(),
        }
    }

    /// Plain-text artifact
    pub fn text(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: "text/plain".to_string(),
        }
    }
}

/// Successful engine outcome persisted with the job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Best discovered formula
    pub best_formula: String,

    /// Best R² score, if the engine reported one
    pub best_r2: Option<f64>,

    /// Number of pareto-optimal candidates found
    pub pareto_count: usize,

    /// Engine-reported extras (formula length, data shape, ...)
    pub metadata: BTreeMap<String, Value>,
}

/// A regression job owned by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job id, unique across the registry
    pub id: Uuid,

    /// Owning user id
    pub user_id: Uuid,

    /// What was requested
    pub descriptor: JobDescriptor,

    /// Price quoted and reserved for this job
    pub price: Decimal,

    /// Lifecycle status
    pub status: JobStatus,

    /// Outcome payload, present once succeeded
    pub result: Option<JobResult>,

    /// Failure note, present once failed
    pub failure: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Completion timestamp, set at terminal status
    pub completed_at: Option<i64>,

    /// Wall-clock run duration in milliseconds
    pub process_time_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = JobDescriptor::new("a,b\n1,2\n", "b", vec!["a".into()], 50);
        assert_eq!(descriptor.run_config, "config0");
        assert_eq!(descriptor.stop_reward, 0.999);
        assert!(descriptor.op_names.is_none());
    }

    #[test]
    fn test_descriptor_builders() {
        let descriptor = JobDescriptor::new("a,b\n1,2\n", "b", vec!["a".into()], 50)
            .with_op_names(vec!["add".into(), "mul".into()])
            .with_run_config("config2")
            .with_stop_reward(0.99);
        assert_eq!(descriptor.op_names.as_deref().unwrap().len(), 2);
        assert_eq!(descriptor.run_config, "config2");
        assert_eq!(descriptor.stop_reward, 0.99);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }
}
