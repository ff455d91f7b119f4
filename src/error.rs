use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Request-level error. Every variant renders as `{"message": ...}` so the
/// frontend can treat all failures uniformly.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// One collapsed answer for unknown email, federated account, missing
    /// hash and wrong password. Keeps login from confirming which accounts
    /// exist.
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// Covers unknown, expired and already-used reset tokens alike.
    #[error("Invalid or expired reset link.")]
    InvalidResetToken,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    /// Detail goes to the server log only; the client sees `public`.
    #[error("{public}")]
    Internal {
        public: &'static str,
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn internal<E: Into<anyhow::Error>>(public: &'static str, source: E) -> Self {
        ApiError::Internal {
            public,
            source: source.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InvalidResetToken => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let ApiError::Internal { public, source } = &self {
            tracing::error!(error = ?source, public = %public, "request failed");
        }

        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Storage failure classified from the driver's structured error kinds.
/// Message text never takes part in the classification.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key")]
    DuplicateKey,

    #[error("row not found")]
    NotFound,

    #[error("store error: {0}")]
    Transient(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey,
            _ => StoreError::Transient(e),
        }
    }
}
