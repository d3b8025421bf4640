//! Error types for the flittpay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::gateway::{GatewayError, ProviderFailure};
use crate::ledger::LedgerError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or malformed caller input, raised before any provider call.
    #[error("Invalid field {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Merchant credentials are not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The provider answered with `response_status: failure`.
    #[error("Provider declined: {0}")]
    ProviderDecline(ProviderFailure),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation error on a missing field.
    pub fn missing(field: &'static str) -> Self {
        AppError::Validation {
            field,
            message: format!("{} is required", field),
        }
    }

    /// Shorthand for a validation error on a malformed field.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::NotFound(msg) => message(StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => message(StatusCode::BAD_REQUEST, msg),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": message, "field": field })),
            )
                .into_response(),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment provider configuration missing",
                )
            }
            AppError::Gateway(e) => {
                tracing::error!("Payment gateway error: {}", e);
                let status = if e.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (
                    status,
                    Json(json!({
                        "message": "Payment provider request failed",
                        "error": e.to_string(),
                    })),
                )
                    .into_response()
            }
            AppError::ProviderDecline(failure) => {
                tracing::warn!(
                    error_code = %failure.error_code,
                    request_id = %failure.request_id,
                    "Provider returned failure: {}",
                    failure.error_message
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "success": false,
                        "error_code": failure.error_code,
                        "error_message": failure.error_message,
                        "request_id": failure.request_id,
                    })),
                )
                    .into_response()
            }
            AppError::InvalidSignature => message(StatusCode::BAD_REQUEST, "Invalid signature"),
            AppError::Ledger(e) => match e {
                LedgerError::NotFound(_) => {
                    message(StatusCode::NOT_FOUND, "Balance not found for this user")
                }
                LedgerError::InsufficientFunds { .. } => {
                    message(StatusCode::BAD_REQUEST, "Insufficient funds")
                }
                LedgerError::Storage(msg) => {
                    tracing::error!("Ledger storage error: {}", msg);
                    message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}
