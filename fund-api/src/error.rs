use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type FundResult<T> = Result<T, FundError>;

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum FundError {
    // Resolution errors
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: Uuid },

    // Lifecycle errors
    #[error("Invalid state for {operation}: {state}")]
    InvalidState { operation: String, state: String },

    // Input validation
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    // Optimistic concurrency, duplicate keys, idempotency body mismatch
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Fund {fund_id} would be left without an Admin")]
    LastAdmin { fund_id: Uuid },

    // Loan policy caps
    #[error("Requested principal {requested} exceeds per-member limit {limit}")]
    MaxLoanExceeded { requested: Decimal, limit: Decimal },

    #[error("Borrower already holds {open} loans, fund allows {limit}")]
    MaxConcurrentLoans { open: i64, limit: i64 },

    // Monotonic-state re-entry
    #[error("{entity} {id} is already fully paid")]
    AlreadyPaid { entity: String, id: Uuid },

    #[error("Voter {voter_id} already voted in session {session_id}")]
    AlreadyVoted { session_id: Uuid, voter_id: Uuid },

    #[error("Voting session {session_id} is already finalised")]
    AlreadyFinalised { session_id: Uuid },

    #[error("{entity} already exists for {key}")]
    AlreadyExists { entity: String, key: String },

    #[error("Voting window for session {session_id} closed at {window_end}")]
    WindowClosed {
        session_id: Uuid,
        window_end: DateTime<Utc>,
    },

    // Forwarded from the identity collaborator
    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Database constraint violation: {constraint} - {details}")]
    DatabaseConstraintViolation { constraint: String, details: String },

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FundError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        FundError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    pub fn invalid_state(operation: &str, state: impl Into<String>) -> Self {
        FundError::InvalidState {
            operation: operation.to_string(),
            state: state.into(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        FundError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn version_conflict(entity: &str, id: Uuid, expected: i32) -> Self {
        FundError::Conflict(format!(
            "{entity} {id} was modified concurrently (expected version {expected})"
        ))
    }
}

impl From<anyhow::Error> for FundError {
    fn from(err: anyhow::Error) -> Self {
        FundError::Internal(err.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for FundError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => FundError::Internal("Database row not found".to_string()),
            sqlx::Error::Database(ref db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    FundError::DatabaseConstraintViolation {
                        constraint: constraint.to_string(),
                        details: db_err.message().to_string(),
                    }
                } else {
                    FundError::Internal(format!("Database error: {}", db_err.message()))
                }
            }
            _ => FundError::Internal(format!("Database error: {err}")),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for FundError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        FundError::Internal(err.to_string())
    }
}
