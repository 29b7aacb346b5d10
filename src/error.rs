// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::key_pool::PoolError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Nutrition provider error: {0}")]
    Provider(String),

    #[error("All API keys have reached their quota")]
    PoolExhausted,

    #[error("Maximum number of attempts reached ({0})")]
    RetriesExhausted(u32),

    #[error("Failed to save profile locally: {0}")]
    LocalPersist(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::PoolExhausted => AppError::PoolExhausted,
            PoolError::RetriesExhausted { attempts } => AppError::RetriesExhausted(attempts),
            PoolError::Provider(e) => AppError::Provider(e.to_string()),
            PoolError::Empty => AppError::Internal(anyhow::anyhow!(err)),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Provider(msg) => {
                (StatusCode::BAD_GATEWAY, "provider_error", Some(msg.clone()))
            }
            AppError::PoolExhausted => {
                tracing::error!("Every API key is exhausted");
                (StatusCode::SERVICE_UNAVAILABLE, "pool_exhausted", None)
            }
            AppError::RetriesExhausted(attempts) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "retries_exhausted",
                Some(format!("gave up after {} attempts", attempts)),
            ),
            AppError::LocalPersist(msg) => {
                tracing::error!(error = %msg, "Local persistence error");
                (StatusCode::INTERNAL_SERVER_ERROR, "local_persist_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
