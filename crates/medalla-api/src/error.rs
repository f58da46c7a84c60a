//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from medalla-core and medalla-state to HTTP status
//! codes and returns JSON bodies with an error code and message. Internal
//! error details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use medalla_state::{RentalError, StockError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient keg stock (409), with the numbers attached.
    #[error("conflict: {message}")]
    OutOfStock {
        message: String,
        details: serde_json::Value,
    },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::OutOfStock { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::OutOfStock { .. } | Self::Conflict(_) => {
                tracing::info!(error = %self, "request conflicts with current state")
            }
            _ => tracing::debug!(error = %self, "client error"),
        }

        let details = match self {
            Self::OutOfStock { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<medalla_core::ValidationError> for AppError {
    fn from(err: medalla_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RentalError> for AppError {
    fn from(err: RentalError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// An unknown keg is a bad reference in the order (422). Running out of
/// stock, or pushing a count past its ceiling, conflicts with the current
/// inventory (409).
impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        match &err {
            StockError::KegNotFound { .. } => Self::Validation(err.to_string()),
            StockError::Overflow { .. } => Self::Conflict(err.to_string()),
            StockError::Insufficient {
                keg_id,
                label,
                requested,
                available,
            } => Self::OutOfStock {
                details: serde_json::json!({
                    "keg_id": keg_id,
                    "keg": label,
                    "requested": requested,
                    "available": available,
                }),
                message: err.to_string(),
            },
        }
    }
}
