use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// One or more request fields failed validation. Carries the full set
    /// of violations, not just the first one.
    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("message does not exist")]
    NotFound,

    #[error("you are not the owner of this object")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    // Deliberately identical wording for bad email and bad password.
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("illegal status transition: {from} -> {requested}")]
    Transition { from: i32, requested: i32 },

    #[error("unknown status code: {0}")]
    UnknownStatus(i32),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Client-facing error payload: `{"errors": ["...", ...]}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            // Transition and unknown-status are integrity faults, not
            // user-recoverable outcomes.
            AppError::Transition { .. }
            | AppError::UnknownStatus(_)
            | AppError::Database(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the underlying database error is a unique-constraint
    /// violation, e.g. a concurrent insert winning a duplicate race.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    fn client_errors(&self) -> Vec<String> {
        match self {
            AppError::Validation(violations) => violations.clone(),
            _ => vec![self.to_string()],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx responses never leak internals; the caller gets a generic
        // message plus a correlation id that is attached to the log line.
        let errors = if status.is_server_error() {
            let correlation_id = Uuid::new_v4();
            tracing::error!(%correlation_id, error = %self, "request failed");
            vec![format!("internal server error (ref: {correlation_id})")]
        } else {
            self.client_errors()
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}
