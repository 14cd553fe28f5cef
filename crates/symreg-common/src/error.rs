//! Error types for the symreg service
//!
//! Every collaborator failure (ledger, registry, runner) is translated at
//! the orchestrator boundary into one of these variants; no raw internal
//! fault reaches a caller unclassified.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Unified caller-visible error type for symreg operations
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request itself is unacceptable: bad epoch budget, empty input,
    /// missing column names. Rejected before any ledger touch.
    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),

    /// The quoted price exceeds the caller's available balance. Terminal
    /// for the whole request; no job is ever started.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Caller error discovered only inside the engine boundary (e.g. a
    /// declared column absent from the data). The charge is reversed.
    #[error("Malformed input for job {job_id}: {message}")]
    MalformedInput { job_id: Uuid, message: String },

    /// The engine crashed or failed to converge after billable work began.
    #[error("Engine failure for job {job_id}: {message}")]
    EngineError { job_id: Uuid, message: String },

    /// The run exceeded the configured wall-clock limit.
    #[error("Job {job_id} timed out after {limit_ms}ms")]
    Timeout { job_id: Uuid, limit_ms: u64 },

    /// No ledger account exists for this user id.
    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    /// Lookup of a job or transaction id failed.
    #[error("Not found: {0}")]
    NotFound(Uuid),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error kinds, mirrored in failure responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidWorkload,
    InsufficientFunds,
    MalformedInput,
    EngineError,
    Timeout,
    UnknownUser,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Stable string form for wire payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidWorkload => "invalid_workload",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::EngineError => "engine_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UnknownUser => "unknown_user",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ServiceError {
    /// Machine-readable classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidWorkload(_) => ErrorKind::InvalidWorkload,
            ServiceError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            ServiceError::MalformedInput { .. } => ErrorKind::MalformedInput,
            ServiceError::EngineError { .. } => ErrorKind::EngineError,
            ServiceError::Timeout { .. } => ErrorKind::Timeout,
            ServiceError::UnknownUser(_) => ErrorKind::UnknownUser,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Storage(_) | ServiceError::Serialization(_) | ServiceError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status the transport layer should map this error to
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidWorkload | ErrorKind::MalformedInput => 400,
            ErrorKind::InsufficientFunds => 402,
            ErrorKind::UnknownUser | ErrorKind::NotFound => 404,
            ErrorKind::Timeout => 504,
            ErrorKind::EngineError | ErrorKind::Internal => 500,
        }
    }
}

// Implement From for common external error types
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let user = Uuid::new_v4();
        let err = ServiceError::UnknownUser(user);
        assert!(err.to_string().contains(&user.to_string()));
    }

    #[test]
    fn test_insufficient_funds_detail() {
        let err = ServiceError::InsufficientFunds {
            required: dec!(55),
            available: dec!(10),
        };
        assert!(err.to_string().contains("55"));
        assert!(err.to_string().contains("10"));
        assert_eq!(err.http_status(), 402);
    }

    #[test]
    fn test_status_mapping() {
        let job_id = Uuid::new_v4();
        assert_eq!(ServiceError::InvalidWorkload("x".into()).http_status(), 400);
        assert_eq!(
            ServiceError::MalformedInput {
                job_id,
                message: "no column z".into()
            }
            .http_status(),
            400
        );
        assert_eq!(ServiceError::NotFound(job_id).http_status(), 404);
        assert_eq!(
            ServiceError::EngineError {
                job_id,
                message: "diverged".into()
            }
            .http_status(),
            500
        );
        assert_eq!(
            ServiceError::Timeout {
                job_id,
                limit_ms: 1000
            }
            .http_status(),
            504
        );
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(ErrorKind::InsufficientFunds.as_str(), "insufficient_funds");
        assert_eq!(ErrorKind::Timeout.as_str(), "timeout");
    }
}
