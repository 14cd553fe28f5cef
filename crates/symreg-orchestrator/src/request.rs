//! Inbound request and response payloads
//!
//! The transport layer hands the orchestrator an already-authenticated
//! caller identity; these are the typed records it exchanges. Dynamic
//! payloads are rejected at the edge with `InvalidWorkload`, never deep
//! inside the pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use symreg_common::{Artifact, JobDescriptor, JobStatus};

/// A job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Pre-validated caller identity
    pub user_id: Uuid,

    /// Delimited rows with header
    pub input_data: String,

    /// Target column name
    pub y_name: String,

    /// Feature column names; empty selects every non-target column
    pub x_names: Vec<String>,

    /// Declared epoch budget
    pub epochs: u32,

    /// Optional operation set restriction
    pub op_names: Option<Vec<String>>,

    /// Optional free constant names
    pub free_consts_names: Option<Vec<String>>,

    /// Engine configuration preset
    pub run_config: String,

    /// Early-stop criterion (R²)
    pub stop_reward: f64,
}

impl JobRequest {
    /// Create a request with default engine settings
    pub fn new(
        user_id: Uuid,
        input_data: impl Into<String>,
        y_name: impl Into<String>,
        x_names: Vec<String>,
        epochs: u32,
    ) -> Self {
        Self {
            user_id,
            input_data: input_data.into(),
            y_name: y_name.into(),
            x_names,
            epochs,
            op_names: None,
            free_consts_names: None,
            run_config: JobDescriptor::DEFAULT_RUN_CONFIG.to_string(),
            stop_reward: JobDescriptor::DEFAULT_STOP_REWARD,
        }
    }

    /// The job descriptor this request describes
    pub fn to_descriptor(&self) -> JobDescriptor {
        JobDescriptor {
            input_data: self.input_data.clone(),
            y_name: self.y_name.clone(),
            x_names: self.x_names.clone(),
            epochs: self.epochs,
            op_names: self.op_names.clone(),
            free_consts_names: self.free_consts_names.clone(),
            run_config: self.run_config.clone(),
            stop_reward: self.stop_reward,
        }
    }
}

/// A settled job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    /// The persisted job id
    pub job_id: Uuid,

    /// Terminal job status (always `Succeeded` on this path; failures
    /// surface as classified errors)
    pub status: JobStatus,

    /// Best discovered formula
    pub best_formula: String,

    /// Best R² score, if reported
    pub best_r2: Option<f64>,

    /// Rows in the pareto-front table
    pub pareto_count: usize,

    /// Pareto-front table, verbatim
    pub pareto_csv: Option<Artifact>,

    /// The amount actually charged
    pub price_charged: Decimal,

    /// Wall-clock run duration in milliseconds
    pub process_time_ms: u64,
}
