//! Executor error types
//!
//! The only error type that leaves the query engine. It carries exactly
//! one of two codes:
//!
//! - INSIGHT_QUERY_INVALID: any validation failure, including an unknown
//!   dataset
//! - INSIGHT_RESULT_TOO_LARGE: the result exceeds the row cap

use std::fmt;

use crate::planner::{PlannerError, Severity};

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Query failed validation
    InsightQueryInvalid,
    /// Result row count exceeds the cap
    InsightResultTooLarge,
}

impl ExecutorErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::InsightQueryInvalid => "INSIGHT_QUERY_INVALID",
            ExecutorErrorCode::InsightResultTooLarge => "INSIGHT_RESULT_TOO_LARGE",
        }
    }

    /// Both codes reject the request; neither is retried
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
}

impl ExecutorError {
    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::InsightQueryInvalid,
            message: reason.into(),
        }
    }

    /// Create an unknown dataset error
    pub fn unknown_dataset(id: &str) -> Self {
        Self::query_invalid(format!("Dataset '{}' does not exist", id))
    }

    /// Create a result too large error
    pub fn result_too_large(rows: usize, cap: usize) -> Self {
        Self {
            code: ExecutorErrorCode::InsightResultTooLarge,
            message: format!("Query result has {} rows, exceeds {}", rows, cap),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_result_too_large(&self) -> bool {
        self.code == ExecutorErrorCode::InsightResultTooLarge
    }
}

impl From<PlannerError> for ExecutorError {
    fn from(err: PlannerError) -> Self {
        Self::query_invalid(err.message())
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
