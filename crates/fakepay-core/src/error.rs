//! Error types for FakePay.

use crate::ids::IdError;
use crate::vpa::AddressError;

/// Result type for FakePay operations.
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur in payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Unknown payment, user, VPA, wallet, or transaction.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// What kind of record was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Duplicate registration or an illegal state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Amount validation failed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Address validation failed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Other malformed or unsupported request.
    #[error("{0}")]
    BadRequest(String),

    /// Payer balance does not cover the amount.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in minor units.
        balance: i64,
        /// Required amount in minor units.
        required: i64,
    },

    /// A transfer named the same wallet on both sides.
    #[error("cannot transfer from a wallet to itself")]
    SelfTransfer,

    /// Credential check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Too many rejected credentials; the transaction has been failed.
    #[error("credential attempts exhausted for transaction {txn_id}")]
    CredentialLocked {
        /// The locked transaction.
        txn_id: String,
    },

    /// Storage or concurrency failure after exhausting retries.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classify the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::InvalidId(_) | Self::BadRequest(_) | Self::SelfTransfer => ErrorKind::BadRequest,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Unauthorized(_) | Self::CredentialLocked { .. } => ErrorKind::Unauthorized,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<AddressError> for PaymentError {
    fn from(err: AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

/// Coarse error classification shared by the service and its clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown record.
    NotFound,
    /// Duplicate or illegal transition.
    Conflict,
    /// Amount validation.
    InvalidAmount,
    /// Address validation.
    InvalidAddress,
    /// Other malformed input.
    BadRequest,
    /// Balance too low.
    InsufficientFunds,
    /// Credential rejected.
    Unauthorized,
    /// Storage/concurrency failure.
    Internal,
}

impl ErrorKind {
    /// Only internal failures are worth retrying unchanged.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Internal)
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidAddress => "invalid_address",
            Self::BadRequest => "bad_request",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Unauthorized => "unauthorized",
            Self::Internal => "internal_error",
        }
    }
}
