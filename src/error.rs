//! Error handling module
//!
//! Provides the unified error type for the reviewer engine, the stores and the
//! HTTP layer. Every variant belongs to one [`ErrorKind`], which decides how
//! the front end renders it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Author {0} not found")]
    AuthorNotFound(Uuid),

    #[error("Pull request {0} not found")]
    PrNotFound(Uuid),

    #[error("Team {0} not found")]
    TeamNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Cannot reassign reviewers for merged pull request {0}")]
    PrMerged(Uuid),

    #[error("Reviewer {reviewer_id} is not assigned to pull request {pull_request_id}")]
    ReviewerNotAssigned {
        pull_request_id: Uuid,
        reviewer_id: Uuid,
    },

    #[error("No available reviewers in the team to replace {0}")]
    NoAvailableReviewers(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced author, pull request, team or user does not exist
    NotFound,
    /// The caller asked for something the current state forbids
    InvalidState,
    /// No eligible reviewer is left in the candidate pool
    NoCandidates,
    /// A uniqueness or reference rule would be broken
    Conflict,
    /// Malformed input
    Validation,
    /// Anything the persistence collaborator failed at
    StorageFailure,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AuthorNotFound(_)
            | AppError::PrNotFound(_)
            | AppError::TeamNotFound(_)
            | AppError::UserNotFound(_) => ErrorKind::NotFound,
            AppError::PrMerged(_) | AppError::ReviewerNotAssigned { .. } => ErrorKind::InvalidState,
            AppError::NoAvailableReviewers(_) => ErrorKind::NoCandidates,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Database(_) | AppError::Pool(_) | AppError::Config(_) => {
                ErrorKind::StorageFailure
            }
        }
    }

    /// Stable machine-readable code for the response body
    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Pool(_) => "POOL_EXHAUSTED",
            AppError::AuthorNotFound(_) => "AUTHOR_NOT_FOUND",
            AppError::PrNotFound(_) => "PR_NOT_FOUND",
            AppError::TeamNotFound(_) => "TEAM_NOT_FOUND",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::PrMerged(_) => "PR_MERGED",
            AppError::ReviewerNotAssigned { .. } => "REVIEWER_NOT_ASSIGNED",
            AppError::NoAvailableReviewers(_) => "NO_AVAILABLE_REVIEWERS",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => match self.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidState | ErrorKind::NoCandidates | ErrorKind::Conflict => {
                    StatusCode::CONFLICT
                }
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage failures are opaque to the caller; the details go to the log.
        let (message, details) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                ("A database error occurred".to_string(), Some(e.to_string()))
            }
            AppError::Pool(e) => {
                error!("Pool error: {:?}", e);
                (
                    "Database connection pool exhausted".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                (
                    "A configuration error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            other => (other.to_string(), None),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(self.code().to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a conflict error
pub fn conflict_error(msg: impl Into<String>) -> AppError {
    AppError::Conflict(msg.into())
}
