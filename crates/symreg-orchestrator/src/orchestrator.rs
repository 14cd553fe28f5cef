//! The orchestrator state machine
//!
//! One `submit` call drives a request through
//! `Received -> Quoted -> Reserved -> Running -> Settled`, with early
//! exits to `Rejected` (validation or funds, before any job exists) and
//! `Failed` (from `Running`, always settling both registry and ledger).

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use symreg_billing::ledger::{LedgerError, LedgerStore};
use symreg_billing::pricing::{PricingError, PricingPolicy};
use symreg_common::{Job, JobResult, JobStatus, Result, ServiceError, Settlement, Transaction};
use symreg_registry::{JobOutcome, ModelRegistry, NewJob, RegistryError};
use symreg_runner::{Engine, JobRunner, RunFailure};

use crate::config::{BillingSettings, Config};
use crate::request::{JobRequest, JobResponse};

/// The billing-gated job orchestrator
///
/// Holds the pricing policy and its three collaborators behind their
/// interfaces; all of their failures are translated into [`ServiceError`]
/// at this boundary.
pub struct Orchestrator {
    ledger: Arc<dyn LedgerStore>,
    registry: Arc<dyn ModelRegistry>,
    runner: JobRunner,
    policy: PricingPolicy,
    billing: BillingSettings,
}

impl Orchestrator {
    /// Wire an orchestrator from configuration and collaborators
    pub fn new(
        config: &Config,
        ledger: Arc<dyn LedgerStore>,
        registry: Arc<dyn ModelRegistry>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        let policy = PricingPolicy::new(config.pricing.base_price, config.pricing.epoch_price)
            .with_max_epochs(config.pricing.max_epochs)
            .with_scale(config.pricing.scale);

        let mut runner = JobRunner::new(engine);
        if let Some(secs) = config.runner.run_timeout_secs {
            runner = runner.with_timeout(Duration::from_secs(secs));
        }

        Self {
            ledger,
            registry,
            runner,
            policy,
            billing: config.billing.clone(),
        }
    }

    /// Submit a job: price, reserve, run, settle.
    ///
    /// Exactly one terminal transaction status and one terminal job status
    /// result from every call that passes the funds gate.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, epochs = request.epochs))]
    pub async fn submit(&self, request: JobRequest) -> Result<JobResponse> {
        // Received -> Quoted
        validate(&request)?;
        let quote = self.policy.quote(request.epochs).map_err(|err| match err {
            PricingError::InvalidWorkload(message) => ServiceError::InvalidWorkload(message),
        })?;

        // Quoted -> Reserved. The job id is minted here so the ledger can
        // reference it; on funds failure no job record ever exists.
        let job_id = Uuid::new_v4();
        let description = format!("regression job {} ({} epochs)", job_id, request.epochs);
        let tx_id = self
            .ledger
            .reserve(request.user_id, quote.amount, job_id, &description)
            .await
            .map_err(map_ledger)?;

        // Reserved -> Running
        let job = match self
            .registry
            .create(NewJob::with_id(
                job_id,
                request.user_id,
                request.to_descriptor(),
                quote.amount,
            ))
            .await
        {
            Ok(job) => job,
            Err(err) => return Err(self.abort_reservation(tx_id, err).await),
        };
        if let Err(err) = self.registry.mark_running(job_id).await {
            return Err(self.abort_reservation(tx_id, err).await);
        }

        info!(%job_id, price = %quote.amount, "job running");
        let started = Instant::now();

        // Running -> Settled / Failed
        match self.runner.run(&job.descriptor).await {
            Ok(run) => {
                let result = JobResult {
                    best_formula: run.best_formula.clone(),
                    best_r2: run.best_r2,
                    pareto_count: run.pareto_count,
                    metadata: run.metadata,
                };
                self.registry
                    .complete(
                        job_id,
                        JobOutcome::Succeeded {
                            result,
                            process_time_ms: run.elapsed_ms,
                        },
                    )
                    .await
                    .map_err(map_registry)?;
                self.ledger
                    .commit(tx_id, Settlement::Charge)
                    .await
                    .map_err(map_ledger)?;

                info!(%job_id, elapsed_ms = run.elapsed_ms, "job succeeded");
                Ok(JobResponse {
                    job_id,
                    status: JobStatus::Succeeded,
                    best_formula: run.best_formula,
                    best_r2: run.best_r2,
                    pareto_count: run.pareto_count,
                    pareto_csv: run.pareto_csv,
                    price_charged: quote.amount,
                    process_time_ms: run.elapsed_ms,
                })
            }
            Err(failure) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                self.registry
                    .complete(
                        job_id,
                        JobOutcome::Failed {
                            reason: failure.to_string(),
                            process_time_ms: elapsed_ms,
                        },
                    )
                    .await
                    .map_err(map_registry)?;

                let settlement = self.settlement_for(&failure);
                self.ledger
                    .commit(tx_id, settlement)
                    .await
                    .map_err(map_ledger)?;

                warn!(%job_id, %failure, ?settlement, "job failed");
                Err(match failure {
                    RunFailure::MalformedInput(message) => {
                        ServiceError::MalformedInput { job_id, message }
                    }
                    RunFailure::EngineError(message) => {
                        ServiceError::EngineError { job_id, message }
                    }
                    RunFailure::Timeout { limit_ms } => ServiceError::Timeout { job_id, limit_ms },
                })
            }
        }
    }

    /// Top up a user's balance; returns the new balance
    #[instrument(skip(self))]
    pub async fn top_up(&self, user_id: Uuid, amount: Decimal) -> Result<Decimal> {
        self.ledger
            .credit(user_id, amount, "balance top-up")
            .await
            .map_err(map_ledger)
    }

    /// Current available balance
    pub async fn balance(&self, user_id: Uuid) -> Result<Decimal> {
        self.ledger.balance(user_id).await.map_err(map_ledger)
    }

    /// Fetch a job by id
    pub async fn job(&self, job_id: Uuid) -> Result<Job> {
        self.registry.get(job_id).await.map_err(map_registry)
    }

    /// All jobs for a user, insertion order
    pub async fn jobs_for_user(&self, user_id: Uuid) -> Vec<Job> {
        self.registry.list_for_user(user_id).await
    }

    /// All transactions for a user, insertion order
    pub async fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        self.ledger.list_for_user(user_id).await.map_err(map_ledger)
    }

    /// Reverse reservations left pending longer than the configured grace
    /// period; returns how many were reversed
    #[instrument(skip(self))]
    pub async fn sweep_reservations(&self) -> Result<usize> {
        let grace = chrono::Duration::seconds(self.billing.reservation_grace_secs as i64);
        self.ledger.sweep_stale(grace).await.map_err(map_ledger)
    }

    /// The billing policy boundary: which run failures keep the charge
    fn settlement_for(&self, failure: &RunFailure) -> Settlement {
        match failure {
            // The engine never truly executed; the caller's fault, but no
            // billable work happened.
            RunFailure::MalformedInput(_) => Settlement::Release,
            RunFailure::EngineError(_) | RunFailure::Timeout { .. } => {
                if self.billing.charge_engine_failures {
                    Settlement::Charge
                } else {
                    Settlement::Release
                }
            }
        }
    }

    /// Release a reservation after an internal failure between Reserved
    /// and Running, so no pending hold leaks
    async fn abort_reservation(&self, tx_id: Uuid, cause: RegistryError) -> ServiceError {
        if let Err(err) = self.ledger.commit(tx_id, Settlement::Release).await {
            warn!(%tx_id, %err, "could not release reservation after registry failure");
        }
        map_registry(cause)
    }
}

fn validate(request: &JobRequest) -> Result<()> {
    if request.input_data.trim().is_empty() {
        return Err(ServiceError::InvalidWorkload(
            "input data must not be empty".to_string(),
        ));
    }
    if request.y_name.trim().is_empty() {
        return Err(ServiceError::InvalidWorkload(
            "target column name must not be empty".to_string(),
        ));
    }
    if request.x_names.iter().any(|name| name.trim().is_empty()) {
        return Err(ServiceError::InvalidWorkload(
            "feature column names must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn map_ledger(err: LedgerError) -> ServiceError {
    match err {
        LedgerError::UnknownUser(user_id) => ServiceError::UnknownUser(user_id),
        LedgerError::InsufficientFunds {
            required,
            available,
        } => ServiceError::InsufficientFunds {
            required,
            available,
        },
        other => ServiceError::Internal(other.to_string()),
    }
}

fn map_registry(err: RegistryError) -> ServiceError {
    match err {
        RegistryError::NotFound(job_id) => ServiceError::NotFound(job_id),
        other => ServiceError::Internal(other.to_string()),
    }
}
