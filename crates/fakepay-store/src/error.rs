//! Error types for FakePay storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind.
        entity: &'static str,
        /// Record key.
        id: String,
    },

    /// A record with the same unique key exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Record kind.
        entity: &'static str,
        /// Record key.
        id: String,
    },

    /// A wallet changed since it was read (optimistic concurrency).
    #[error("wallet version conflict: {user_id} expected={expected} actual={actual}")]
    VersionConflict {
        /// Wallet owner.
        user_id: String,
        /// Version the writer read.
        expected: u64,
        /// Version found at commit time.
        actual: u64,
    },

    /// The stored record is not in the state the commit requires.
    #[error("state conflict: {0}")]
    StateConflict(String),
}

impl StoreError {
    pub(crate) fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<StoreError> for fakepay_core::PaymentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::AlreadyExists { entity, id } => {
                Self::Conflict(format!("{entity} already exists: {id}"))
            }
            StoreError::StateConflict(msg) => Self::Conflict(msg),
            err @ (StoreError::Database(_)
            | StoreError::Serialization(_)
            | StoreError::VersionConflict { .. }) => Self::Internal(err.to_string()),
        }
    }
}
