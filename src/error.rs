//! Typed errors and HTTP mapping.
//!
//! Every error becomes exactly one response envelope `{code, msg}` whose `code` equals the
//! HTTP status it is sent with.

use crate::response::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Invalid entity descriptors or environment, raised at startup only.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("entity {table}: primary key '{pk}' is not a declared field")]
    MissingPrimaryKey { table: String, pk: String },
    #[error("entity {table}: duplicate field '{field}'")]
    DuplicateField { table: String, field: String },
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("entity {table}: validation rule for unknown field '{field}'")]
    UnknownField { table: String, field: String },
    #[error("entity {table}: invalid pattern for '{field}': {reason}")]
    InvalidPattern { table: String, field: String, reason: String },
    #[error("env {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

/// Storage engine faults.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated on '{field}'")]
    UniqueViolation { field: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("decode: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience type alias for handler and operation return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) | AppError::Store(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Application code carried in the envelope; the HTTP status reused as a number.
    pub fn code(&self) -> i32 {
        i32::from(self.status().as_u16())
    }

    /// Wraps a storage fault with the failed step, e.g. `"query failed"`.
    pub fn storage(context: &str, err: StoreError) -> Self {
        AppError::Internal(format!("{}: {}", context, err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body: Envelope<()> = Envelope::error(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_http_status() {
        assert_eq!(AppError::BadRequest("x".into()).code(), 400);
        assert_eq!(AppError::Validation("x".into()).code(), 400);
        assert_eq!(AppError::Unauthorized("x".into()).code(), 401);
        assert_eq!(AppError::Forbidden("x".into()).code(), 403);
        assert_eq!(AppError::NotFound("x".into()).code(), 404);
        assert_eq!(AppError::PayloadTooLarge("x".into()).code(), 413);
        assert_eq!(AppError::Internal("x".into()).code(), 500);
    }

    #[test]
    fn storage_faults_are_internal() {
        let err = AppError::from(StoreError::UniqueViolation { field: "email".into() });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn into_response_uses_matching_status() {
        let resp = AppError::NotFound("record not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
