//! Placement Error Types
//!
//! Every failure of the placement pipeline, with stable codes for API responses.

use thiserror::Error;

use super::state::StudentStatus;
use super::types::StudentId;

/// Placement error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    // === Auth (delegated) ===
    #[error("User not authenticated")]
    Unauthorized,

    #[error("Role not permitted to change student placement")]
    Forbidden,

    // === Validation Errors ===
    #[error("Student {student_id} is already in grade code {grade_code} and stream section {stream_section}")]
    AlreadyAtTarget {
        student_id: StudentId,
        grade_code: String,
        stream_section: String,
    },

    #[error("Invalid external transfer request: {0}")]
    InvalidExternalTransferRequest(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown grade code: {0}")]
    UnknownGradeCode(String),

    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),

    // === Student Errors ===
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    #[error("Student {student_id} is {status} and can no longer change placement")]
    NotTransferable {
        student_id: StudentId,
        status: StudentStatus,
    },

    #[error("Student already exists: {0}")]
    DuplicateStudent(StudentId),

    // === Concurrency Errors ===
    #[error("Concurrent update on student {student_id} (read version {read_version})")]
    Conflict {
        student_id: StudentId,
        read_version: u64,
    },

    #[error("Timed out waiting for student {0}")]
    LockTimeout(StudentId),

    // === System Errors ===
    #[error("History rewrite rejected for student {0}")]
    HistoryRewrite(StudentId),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl PlacementError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::Unauthorized => "UNAUTHORIZED",
            PlacementError::Forbidden => "FORBIDDEN",
            PlacementError::AlreadyAtTarget { .. } => "ALREADY_AT_TARGET",
            PlacementError::InvalidExternalTransferRequest(_) => "INVALID_EXTERNAL_TRANSFER",
            PlacementError::InvalidParameter(_) => "INVALID_PARAMETER",
            PlacementError::UnknownGradeCode(_) => "UNKNOWN_GRADE_CODE",
            PlacementError::InvalidPromotion(_) => "INVALID_PROMOTION",
            PlacementError::StudentNotFound(_) => "STUDENT_NOT_FOUND",
            PlacementError::NotTransferable { .. } => "NOT_TRANSFERABLE",
            PlacementError::DuplicateStudent(_) => "DUPLICATE_STUDENT",
            PlacementError::Conflict { .. } => "CONFLICT",
            PlacementError::LockTimeout(_) => "LOCK_TIMEOUT",
            PlacementError::HistoryRewrite(_) => "HISTORY_REWRITE",
            PlacementError::DatabaseError(_) => "DATABASE_ERROR",
            PlacementError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// Numeric code used in the `{code, msg, data}` response envelope
    pub fn api_code(&self) -> i32 {
        use crate::gateway::types::error_codes;

        match self {
            PlacementError::Unauthorized => error_codes::AUTH_FAILED,
            PlacementError::Forbidden => error_codes::FORBIDDEN,
            PlacementError::AlreadyAtTarget { .. } => error_codes::ALREADY_AT_TARGET,
            PlacementError::InvalidExternalTransferRequest(_) => {
                error_codes::INVALID_EXTERNAL_TRANSFER
            }
            PlacementError::InvalidParameter(_) => error_codes::INVALID_PARAMETER,
            PlacementError::UnknownGradeCode(_) => error_codes::UNKNOWN_GRADE_CODE,
            PlacementError::InvalidPromotion(_) => error_codes::INVALID_PROMOTION,
            PlacementError::StudentNotFound(_) => error_codes::STUDENT_NOT_FOUND,
            PlacementError::NotTransferable { .. } => error_codes::NOT_TRANSFERABLE,
            PlacementError::DuplicateStudent(_) => error_codes::DUPLICATE_STUDENT,
            PlacementError::Conflict { .. } => error_codes::CONFLICT,
            PlacementError::LockTimeout(_) => error_codes::LOCK_TIMEOUT,
            PlacementError::HistoryRewrite(_)
            | PlacementError::DatabaseError(_)
            | PlacementError::SystemError(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            PlacementError::Unauthorized => 401,
            PlacementError::Forbidden => 403,
            PlacementError::AlreadyAtTarget { .. }
            | PlacementError::InvalidExternalTransferRequest(_)
            | PlacementError::InvalidParameter(_)
            | PlacementError::UnknownGradeCode(_)
            | PlacementError::InvalidPromotion(_) => 400,
            PlacementError::StudentNotFound(_) => 404,
            PlacementError::Conflict { .. }
            | PlacementError::LockTimeout(_)
            | PlacementError::DuplicateStudent(_) => 409,
            PlacementError::NotTransferable { .. } => 422,
            PlacementError::HistoryRewrite(_)
            | PlacementError::DatabaseError(_)
            | PlacementError::SystemError(_) => 500,
        }
    }

    /// Whether a fresh attempt by the caller may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlacementError::Conflict { .. } | PlacementError::LockTimeout(_)
        )
    }
}

impl From<sqlx::Error> for PlacementError {
    fn from(e: sqlx::Error) -> Self {
        PlacementError::DatabaseError(e.to_string())
    }
}

impl From<anyhow::Error> for PlacementError {
    fn from(e: anyhow::Error) -> Self {
        PlacementError::SystemError(e.to_string())
    }
}
