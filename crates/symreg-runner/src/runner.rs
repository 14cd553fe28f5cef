//! Job runner
//!
//! Executes one job to completion or classified failure. The engine call
//! is the single long-blocking step in the system; it runs on tokio's
//! blocking pool so request acceptance and ledger reads stay responsive,
//! and an optional wall-clock timeout bounds it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use symreg_common::{Artifact, JobDescriptor};

use crate::dataset::{Dataset, DatasetError};
use crate::engine::{Engine, EngineTask, DATA_FILENAME, LOG_FILENAME, PARETO_FILENAME};

/// Classified run failure
///
/// The orchestrator bills differently depending on the class:
/// `MalformedInput` means the engine never truly executed and the charge
/// is reversed; `EngineError` and `Timeout` occur after billable work
/// began.
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Run timed out after {limit_ms}ms")]
    Timeout { limit_ms: u64 },
}

impl From<DatasetError> for RunFailure {
    fn from(err: DatasetError) -> Self {
        RunFailure::MalformedInput(err.to_string())
    }
}

/// Successful run outcome
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Best discovered formula
    pub best_formula: String,

    /// Best R² score, if reported
    pub best_r2: Option<f64>,

    /// Rows in the pareto-front table (excluding its header)
    pub pareto_count: usize,

    /// Pareto-front table, verbatim
    pub pareto_csv: Option<Artifact>,

    /// Remaining named artifacts (data echo, run log)
    pub artifacts: Vec<Artifact>,

    /// Engine metadata plus adapter-added entries (data shape, ...)
    pub metadata: BTreeMap<String, Value>,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

/// Adapter that runs one engine search per call
pub struct JobRunner {
    engine: Arc<dyn Engine>,
    timeout: Option<Duration>,
}

impl JobRunner {
    /// Create a runner with no wall-clock limit
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            timeout: None,
        }
    }

    /// Bound each run by a wall-clock timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run one job to completion or classified failure.
    ///
    /// Never unwinds: engine panics are contained by the blocking task and
    /// reported as `EngineError`. On any failure no partial artifacts are
    /// returned.
    #[instrument(skip(self, descriptor), fields(epochs = descriptor.epochs))]
    pub async fn run(&self, descriptor: &JobDescriptor) -> Result<RunResult, RunFailure> {
        // Schema validation happens before any engine work; failures here
        // are the caller's fault and are billed as such.
        let dataset = Dataset::parse(
            &descriptor.input_data,
            &descriptor.y_name,
            &descriptor.x_names,
        )?;
        let shape = dataset.shape();
        let task = EngineTask::from_descriptor(descriptor, dataset);

        let workdir = tempfile::tempdir()
            .map_err(|e| RunFailure::EngineError(format!("cannot create working directory: {e}")))?;

        let start = Instant::now();
        let engine = Arc::clone(&self.engine);
        let path = workdir.path().to_path_buf();
        let handle = tokio::task::spawn_blocking(move || engine.search(&task, &path));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking task cannot be killed; it keeps running
                    // until it notices its scratch directory is gone.
                    warn!(limit_ms = limit.as_millis() as u64, "engine run timed out");
                    return Err(RunFailure::Timeout {
                        limit_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => handle.await,
        };

        let output = match joined {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return Err(RunFailure::EngineError(err.to_string())),
            Err(join_err) if join_err.is_panic() => {
                return Err(RunFailure::EngineError("engine panicked".to_string()))
            }
            Err(join_err) => return Err(RunFailure::EngineError(join_err.to_string())),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let pareto_csv = read_artifact(workdir.path(), PARETO_FILENAME).map(|c| Artifact::csv(PARETO_FILENAME, c));
        let pareto_count = pareto_csv
            .as_ref()
            .map(|a| a.content.lines().count().saturating_sub(1))
            .unwrap_or(0);

        let mut artifacts = Vec::new();
        if let Some(content) = read_artifact(workdir.path(), DATA_FILENAME) {
            artifacts.push(Artifact::csv(DATA_FILENAME, content));
        }
        if let Some(content) = read_artifact(workdir.path(), LOG_FILENAME) {
            artifacts.push(Artifact::text(LOG_FILENAME, content));
        }

        let mut metadata = output.metadata;
        metadata.insert("data_shape".to_string(), Value::String(shape));
        metadata.insert(
            "formula_length".to_string(),
            Value::from(output.best_formula.len()),
        );

        debug!(elapsed_ms, pareto_count, "engine run finished");
        Ok(RunResult {
            best_formula: output.best_formula,
            best_r2: output.best_r2,
            pareto_count,
            pareto_csv,
            artifacts,
            metadata,
            elapsed_ms,
        })
    }
}

fn read_artifact(workdir: &Path, filename: &str) -> Option<String> {
    let path = workdir.join(filename);
    match std::fs::read_to_string(&path) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!(%filename, %err, "could not read run artifact");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutput;
    use std::sync::atomic::{AtomicBool, Ordering};

    const DATA: &str = "a,b,y\n1,2,3\n4,5,6\n";

    struct FixtureEngine;

    impl Engine for FixtureEngine {
        fn search(&self, task: &EngineTask, workdir: &Path) -> anyhow::Result<EngineOutput> {
            std::fs::write(
                workdir.join(PARETO_FILENAME),
                "complexity,expression,r2\n1,a,0.5\n3,a+b,0.98\n",
            )?;
            std::fs::write(workdir.join(DATA_FILENAME), &task.dataset.shape())?;
            std::fs::write(workdir.join(LOG_FILENAME), "epoch 1\nepoch 2\n")?;
            Ok(EngineOutput {
                best_formula: "a + b".to_string(),
                best_r2: Some(0.98),
                metadata: BTreeMap::new(),
            })
        }
    }

    struct FailingEngine;

    impl Engine for FailingEngine {
        fn search(&self, _task: &EngineTask, _workdir: &Path) -> anyhow::Result<EngineOutput> {
            anyhow::bail!("search did not converge")
        }
    }

    struct PanickingEngine;

    impl Engine for PanickingEngine {
        fn search(&self, _task: &EngineTask, _workdir: &Path) -> anyhow::Result<EngineOutput> {
            panic!("index out of bounds")
        }
    }

    struct SlowEngine;

    impl Engine for SlowEngine {
        fn search(&self, _task: &EngineTask, _workdir: &Path) -> anyhow::Result<EngineOutput> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(EngineOutput {
                best_formula: "late".to_string(),
                best_r2: None,
                metadata: BTreeMap::new(),
            })
        }
    }

    /// Records whether the engine was ever invoked
    struct TrackingEngine(Arc<AtomicBool>);

    impl Engine for TrackingEngine {
        fn search(&self, _task: &EngineTask, _workdir: &Path) -> anyhow::Result<EngineOutput> {
            self.0.store(true, Ordering::SeqCst);
            anyhow::bail!("should not run")
        }
    }

    fn descriptor() -> JobDescriptor {
        JobDescriptor::new(DATA, "y", vec!["a".into(), "b".into()], 50)
    }

    #[tokio::test]
    async fn test_successful_run_collects_artifacts() {
        let runner = JobRunner::new(Arc::new(FixtureEngine));
        let result = runner.run(&descriptor()).await.unwrap();

        assert_eq!(result.best_formula, "a + b");
        assert_eq!(result.best_r2, Some(0.98));
        assert_eq!(result.pareto_count, 2);

        let pareto = result.pareto_csv.unwrap();
        assert_eq!(pareto.filename, PARETO_FILENAME);
        assert!(pareto.content.contains("a+b"));

        let names: Vec<_> = result.artifacts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec![DATA_FILENAME, LOG_FILENAME]);
        assert_eq!(
            result.metadata.get("data_shape"),
            Some(&Value::String("2x2".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_column_never_reaches_engine() {
        let invoked = Arc::new(AtomicBool::new(false));
        let runner = JobRunner::new(Arc::new(TrackingEngine(Arc::clone(&invoked))));

        let descriptor = JobDescriptor::new(DATA, "y", vec!["z".into()], 50);
        let err = runner.run(&descriptor).await.unwrap_err();

        assert!(matches!(err, RunFailure::MalformedInput(_)));
        assert!(err.to_string().contains("'z'"));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_engine_error_is_classified() {
        let runner = JobRunner::new(Arc::new(FailingEngine));
        let err = runner.run(&descriptor()).await.unwrap_err();

        assert!(matches!(err, RunFailure::EngineError(_)));
        assert!(err.to_string().contains("did not converge"));
    }

    #[tokio::test]
    async fn test_engine_panic_is_contained() {
        let runner = JobRunner::new(Arc::new(PanickingEngine));
        let err = runner.run(&descriptor()).await.unwrap_err();

        assert!(matches!(err, RunFailure::EngineError(_)));
        assert!(err.to_string().contains("panicked"));
    }

    #[tokio::test]
    async fn test_timeout_is_enforced_by_runner() {
        let runner =
            JobRunner::new(Arc::new(SlowEngine)).with_timeout(Duration::from_millis(50));
        let err = runner.run(&descriptor()).await.unwrap_err();

        assert!(matches!(err, RunFailure::Timeout { limit_ms: 50 }));
    }

    #[tokio::test]
    async fn test_missing_artifacts_are_not_fatal() {
        struct BareEngine;
        impl Engine for BareEngine {
            fn search(&self, _task: &EngineTask, _workdir: &Path) -> anyhow::Result<EngineOutput> {
                Ok(EngineOutput {
                    best_formula: "1".to_string(),
                    best_r2: None,
                    metadata: BTreeMap::new(),
                })
            }
        }

        let runner = JobRunner::new(Arc::new(BareEngine));
        let result = runner.run(&descriptor()).await.unwrap();
        assert!(result.pareto_csv.is_none());
        assert_eq!(result.pareto_count, 0);
        assert!(result.artifacts.is_empty());
    }
}
