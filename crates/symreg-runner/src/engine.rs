//! The opaque engine boundary
//!
//! The formula-search algorithm is a black box: given a validated dataset,
//! column roles, and an epoch budget it produces a formula, a score, and a
//! set of well-known artifact files in its working directory. Everything
//! behind [`Engine::search`] is out of scope here; the adapter only
//! prepares its input and collects its output.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use symreg_common::JobDescriptor;

use crate::dataset::Dataset;

/// Pareto-front table written by the engine
pub const PARETO_FILENAME: &str = "SR_curves_pareto.csv";

/// Echo of the training data written by the engine
pub const DATA_FILENAME: &str = "SR_curves_data.csv";

/// Textual run log written by the engine
pub const LOG_FILENAME: &str = "SR.log";

/// Operations used when the caller does not restrict the set
pub const DEFAULT_OP_NAMES: &[&str] = &[
    "add", "sub", "mul", "div", "sqrt", "log", "exp", "n2", "n3", "inv",
];

/// Fully-resolved engine input: validated data plus run parameters with
/// all defaults applied
#[derive(Debug, Clone)]
pub struct EngineTask {
    /// Validated numeric table
    pub dataset: Dataset,

    /// Declared epoch budget
    pub epochs: u32,

    /// Operation set for the search
    pub op_names: Vec<String>,

    /// Free constant names
    pub free_consts_names: Vec<String>,

    /// Engine configuration preset
    pub run_config: String,

    /// Early-stop criterion (R²)
    pub stop_reward: f64,
}

impl EngineTask {
    /// Resolve a job descriptor against its parsed dataset
    pub fn from_descriptor(descriptor: &JobDescriptor, dataset: Dataset) -> Self {
        let op_names = descriptor.op_names.clone().unwrap_or_else(|| {
            DEFAULT_OP_NAMES.iter().map(|s| s.to_string()).collect()
        });

        Self {
            dataset,
            epochs: descriptor.epochs,
            op_names,
            free_consts_names: descriptor.free_consts_names.clone().unwrap_or_default(),
            run_config: descriptor.run_config.clone(),
            stop_reward: descriptor.stop_reward,
        }
    }
}

/// What a successful search reports back
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Best discovered formula
    pub best_formula: String,

    /// Best R² score, if the engine computed one
    pub best_r2: Option<f64>,

    /// Engine-reported extras
    pub metadata: BTreeMap<String, Value>,
}

/// The opaque computation engine
///
/// `search` blocks for the job's full duration and may take seconds to
/// minutes; the runner dispatches it on a dedicated blocking context.
/// Implementations write their artifact files ([`PARETO_FILENAME`],
/// [`DATA_FILENAME`], [`LOG_FILENAME`]) into `workdir`.
pub trait Engine: Send + Sync + 'static {
    fn search(&self, task: &EngineTask, workdir: &Path) -> anyhow::Result<EngineOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_applies_defaults() {
        let descriptor = JobDescriptor::new("a,y\n1,2\n", "y", vec![], 50);
        let dataset = Dataset::parse(&descriptor.input_data, "y", &[]).unwrap();
        let task = EngineTask::from_descriptor(&descriptor, dataset);

        assert_eq!(task.op_names.len(), DEFAULT_OP_NAMES.len());
        assert!(task.free_consts_names.is_empty());
        assert_eq!(task.run_config, "config0");
    }

    #[test]
    fn test_task_keeps_caller_overrides() {
        let descriptor = JobDescriptor::new("a,y\n1,2\n", "y", vec![], 50)
            .with_op_names(vec!["add".into()])
            .with_free_consts(vec!["c0".into()]);
        let dataset = Dataset::parse(&descriptor.input_data, "y", &[]).unwrap();
        let task = EngineTask::from_descriptor(&descriptor, dataset);

        assert_eq!(task.op_names, vec!["add"]);
        assert_eq!(task.free_consts_names, vec!["c0"]);
    }
}
