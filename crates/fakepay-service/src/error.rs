//! API error types and responses.
//!
//! Error bodies are flat: `{"error": "<message>", "code": "<kind>", "details": {...}}`.
//! Clients display `error` verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fakepay_core::{ErrorKind, IdError, PaymentError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing API key or rejected credential.
    #[error("{message}")]
    Unauthorized {
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Invalid input.
    #[error("{message}")]
    BadRequest {
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Duplicate registration or illegal state transition.
    #[error("{0}")]
    Conflict(String),

    /// Payer balance does not cover the amount.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// A confirmation finalized the payment as `FAILED`.
    #[error("{message}")]
    PaymentFailed {
        /// Human-readable message.
        message: String,
        /// The stored outcome.
        details: serde_json::Value,
    },

    /// A confirmation ran out of PIN attempts; the payment is `FAILED`.
    #[error("{message}")]
    CredentialLocked {
        /// Human-readable message.
        message: String,
        /// The stored outcome.
        details: serde_json::Value,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Missing or wrong service API key.
    #[must_use]
    pub fn missing_api_key() -> Self {
        Self::Unauthorized {
            code: "unauthorized",
            message: "a valid x-api-key header is required".into(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message, None)
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message, None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            err @ Self::InsufficientFunds { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                err.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::PaymentFailed { message, details } => (
                StatusCode::PAYMENT_REQUIRED,
                "payment_failed",
                message,
                Some(details),
            ),
            Self::CredentialLocked { message, details } => (
                StatusCode::UNAUTHORIZED,
                "credential_locked",
                message,
                Some(details),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let kind = err.kind();
        match err {
            PaymentError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            PaymentError::CredentialLocked { .. } => Self::Unauthorized {
                code: "credential_locked",
                message: err.to_string(),
            },
            PaymentError::Internal(msg) => Self::Internal(msg),
            err => match kind {
                ErrorKind::NotFound => Self::NotFound(err.to_string()),
                ErrorKind::Conflict => Self::Conflict(err.to_string()),
                ErrorKind::Unauthorized => Self::Unauthorized {
                    code: kind.code(),
                    message: err.to_string(),
                },
                ErrorKind::Internal => Self::Internal(err.to_string()),
                ErrorKind::InvalidAmount
                | ErrorKind::InvalidAddress
                | ErrorKind::BadRequest
                | ErrorKind::InsufficientFunds => Self::BadRequest {
                    code: kind.code(),
                    message: err.to_string(),
                },
            },
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        PaymentError::from(err).into()
    }
}

impl From<fakepay_store::StoreError> for ApiError {
    fn from(err: fakepay_store::StoreError) -> Self {
        PaymentError::from(err).into()
    }
}
