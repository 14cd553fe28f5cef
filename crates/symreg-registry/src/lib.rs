//! # Symreg Registry
//!
//! Durable record of regression jobs keyed by user and job id. Jobs are
//! created `Queued`, marked `Running` when the engine is invoked, and
//! finalized exactly once with a success payload or a failure note. The
//! registry owns jobs exclusively; the ledger references them by id only.

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use symreg_common::{now_millis, Job, JobDescriptor, JobResult, JobStatus};

/// Errors from registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job id already exists: {0}")]
    DuplicateJobId(Uuid),

    #[error("Job {job_id} is {from:?}; cannot transition to {to:?}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}

/// A job about to be persisted
///
/// The id is minted by the caller so the ledger can reference the job
/// before its record exists.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub descriptor: JobDescriptor,
    pub price: Decimal,
}

impl NewJob {
    /// New job with a freshly minted id
    pub fn new(user_id: Uuid, descriptor: JobDescriptor, price: Decimal) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, descriptor, price)
    }

    /// New job under a caller-supplied id
    pub fn with_id(id: Uuid, user_id: Uuid, descriptor: JobDescriptor, price: Decimal) -> Self {
        Self {
            id,
            user_id,
            descriptor,
            price,
        }
    }
}

/// Terminal outcome applied to a running job
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded {
        result: JobResult,
        process_time_ms: u64,
    },
    Failed {
        reason: String,
        process_time_ms: u64,
    },
}

impl JobOutcome {
    fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Succeeded { .. } => JobStatus::Succeeded,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Trait for job registry backends
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Persist a new job with status `Queued`; job ids must be unique
    async fn create(&self, new_job: NewJob) -> Result<Job, RegistryError>;

    /// Transition `Queued -> Running`
    async fn mark_running(&self, job_id: Uuid) -> Result<(), RegistryError>;

    /// Finalize a job exactly once with its outcome
    async fn complete(&self, job_id: Uuid, outcome: JobOutcome) -> Result<Job, RegistryError>;

    /// Fetch a job by id
    async fn get(&self, job_id: Uuid) -> Result<Job, RegistryError>;

    /// All jobs for a user, finite, insertion order
    async fn list_for_user(&self, user_id: Uuid) -> Vec<Job>;

    /// Number of jobs recorded for a user
    async fn count_for_user(&self, user_id: Uuid) -> usize;
}

/// In-memory registry implementation
///
/// DashMap for concurrent access, with a per-user index preserving
/// insertion order.
pub struct InMemoryRegistry {
    /// All jobs by id
    jobs: DashMap<Uuid, Job>,

    /// Job ids per user, insertion order
    by_user: DashMap<Uuid, Vec<Uuid>>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            by_user: DashMap::new(),
        }
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelRegistry for InMemoryRegistry {
    async fn create(&self, new_job: NewJob) -> Result<Job, RegistryError> {
        if self.jobs.contains_key(&new_job.id) {
            return Err(RegistryError::DuplicateJobId(new_job.id));
        }

        let job = Job {
            id: new_job.id,
            user_id: new_job.user_id,
            descriptor: new_job.descriptor,
            price: new_job.price,
            status: JobStatus::Queued,
            result: None,
            failure: None,
            created_at: now_millis(),
            completed_at: None,
            process_time_ms: None,
        };

        self.by_user.entry(job.user_id).or_default().push(job.id);
        self.jobs.insert(job.id, job.clone());
        debug!(job_id = %job.id, user_id = %job.user_id, "created job");
        Ok(job)
    }

    async fn mark_running(&self, job_id: Uuid) -> Result<(), RegistryError> {
        let mut job = self
            .jobs
            .get_mut(&job_id)
            .ok_or(RegistryError::NotFound(job_id))?;

        if job.status != JobStatus::Queued {
            return Err(RegistryError::InvalidTransition {
                job_id,
                from: job.status,
                to: JobStatus::Running,
            });
        }
        job.status = JobStatus::Running;
        Ok(())
    }

    async fn complete(&self, job_id: Uuid, outcome: JobOutcome) -> Result<Job, RegistryError> {
        let mut job = self
            .jobs
            .get_mut(&job_id)
            .ok_or(RegistryError::NotFound(job_id))?;

        if job.status.is_terminal() {
            return Err(RegistryError::InvalidTransition {
                job_id,
                from: job.status,
                to: outcome.status(),
            });
        }

        job.status = outcome.status();
        job.completed_at = Some(now_millis());
        match outcome {
            JobOutcome::Succeeded {
                result,
                process_time_ms,
            } => {
                job.result = Some(result);
                job.process_time_ms = Some(process_time_ms);
            }
            JobOutcome::Failed {
                reason,
                process_time_ms,
            } => {
                job.failure = Some(reason);
                job.process_time_ms = Some(process_time_ms);
            }
        }
        debug!(%job_id, status = ?job.status, "completed job");
        Ok(job.clone())
    }

    async fn get(&self, job_id: Uuid) -> Result<Job, RegistryError> {
        self.jobs
            .get(&job_id)
            .map(|job| job.clone())
            .ok_or(RegistryError::NotFound(job_id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Vec<Job> {
        let ids = match self.by_user.get(&user_id) {
            Some(ids) => ids.clone(),
            None => return Vec::new(),
        };
        ids.iter()
            .filter_map(|id| self.jobs.get(id).map(|job| job.clone()))
            .collect()
    }

    async fn count_for_user(&self, user_id: Uuid) -> usize {
        self.by_user
            .get(&user_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }
}
