//! Client error types.

use fakepay_core::{ErrorKind, ResolveError};

use crate::types::ConfirmView;

/// Errors that can occur when using the FakePay client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response with no more specific mapping.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Unknown user, VPA, payment, wallet or transaction.
    #[error("not found: {message}")]
    NotFound {
        /// Server message.
        message: String,
    },

    /// Duplicate registration or an illegal state transition.
    #[error("conflict: {message}")]
    Conflict {
        /// Server message.
        message: String,
    },

    /// Payer balance does not cover the amount.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The confirmation finalized the payment as `FAILED`.
    #[error("payment failed: {message}")]
    PaymentFailed {
        /// Server message.
        message: String,
        /// The stored outcome.
        outcome: Box<ConfirmView>,
    },

    /// Wrong PIN or missing API key.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server message.
        message: String,
    },

    /// Too many wrong PINs; the transaction is now failed.
    #[error("credential locked: {message}")]
    CredentialLocked {
        /// Server message.
        message: String,
    },

    /// A scanned code is not a payment.
    #[error("unrecognized code: {0}")]
    Resolve(#[from] ResolveError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// How the service classified the failure. `None` for errors raised locally.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::NotFound { .. } => Some(ErrorKind::NotFound),
            Self::Conflict { .. } => Some(ErrorKind::Conflict),
            Self::InsufficientFunds { .. } | Self::PaymentFailed { .. } => {
                Some(ErrorKind::InsufficientFunds)
            }
            Self::Unauthorized { .. } | Self::CredentialLocked { .. } => {
                Some(ErrorKind::Unauthorized)
            }
            Self::Api { code, .. } => match code.as_str() {
                "invalid_amount" => Some(ErrorKind::InvalidAmount),
                "invalid_address" => Some(ErrorKind::InvalidAddress),
                "bad_request" => Some(ErrorKind::BadRequest),
                "internal_error" => Some(ErrorKind::Internal),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether sending the same request again may succeed: internal service
    /// failures and requests that never reached the service. Failed payments and
    /// rejected PINs are final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            other => other.kind().is_some_and(ErrorKind::is_retryable),
        }
    }

    /// Message suitable for showing to the payer.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Api { message, .. }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::PaymentFailed { message, .. }
            | Self::Unauthorized { message }
            | Self::CredentialLocked { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
