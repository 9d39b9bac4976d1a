//! Identifier types for FakePay.
//!
//! This module provides strongly-typed identifiers for users, VPAs, payment intents,
//! and UPI transactions.
//!
//! # Macro-based ID Types
//!
//! Client-issued identifiers (`UserId`, `PaymentId`) are opaque strings with a restricted
//! alphabet, so they are safe to embed in URL paths and storage keys. The
//! `string_id_type!` macro keeps their parsing, serialization, and display consistent.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Macro to define a validated string identifier with standard trait implementations.
///
/// Generates a newtype around `String` with `FromStr`, `Display`, `Debug`,
/// `TryFrom<String>`, `Into<String>`, `AsRef<str>` and string (de)serialization that
/// rejects malformed input.
macro_rules! string_id_type {
    ($name:ident, $doc:expr, $max_len:expr, $allowed:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum length in bytes.
            pub const MAX_LEN: usize = $max_len;

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the identifier bytes (used for storage keys).
            #[must_use]
            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }

            fn validate(s: &str) -> Result<(), IdError> {
                if s.is_empty() {
                    return Err(IdError::Empty);
                }
                if s.len() > Self::MAX_LEN {
                    return Err(IdError::TooLong { max: Self::MAX_LEN });
                }
                let allowed: fn(char) -> bool = $allowed;
                match s.chars().find(|c| !allowed(*c)) {
                    Some(c) => Err(IdError::InvalidCharacter(c)),
                    None => Ok(()),
                }
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::validate(s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::validate(&value)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_type!(
    UserId,
    "An opaque user identifier issued by the client (e.g. `usr_1718000000000_k3j9x2a1b`).",
    128,
    |c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
);

string_id_type!(
    PaymentId,
    "A payment intent identifier, as carried in `/pay/<id>` links and the UPI `tr` parameter.",
    64,
    |c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
);

impl PaymentId {
    /// Generate a new payment identifier of the form `pay_<ulid>`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("pay_{}", Ulid::new().to_string().to_lowercase()))
    }
}

/// A VPA identifier (UUID v4).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VpaId(uuid::Uuid);

impl VpaId {
    /// Generate a new random `VpaId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl FromStr for VpaId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for VpaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VpaId({})", self.0)
    }
}

impl fmt::Display for VpaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VpaId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VpaId> for String {
    fn from(id: VpaId) -> Self {
        id.0.to_string()
    }
}

/// A UPI transaction identifier using ULID for time-ordering.
///
/// Transaction IDs are time-ordered so the history index can be scanned newest-first
/// by key, and the creation timestamp is recoverable from the ID itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxnId(Ulid);

impl TxnId {
    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Create a `TxnId` from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }

    /// The creation time encoded in the ULID (millisecond precision).
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.0.datetime())
    }
}

impl FromStr for TxnId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxnId({})", self.0)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TxnId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxnId> for String {
    fn from(id: TxnId) -> Self {
        id.0.to_string()
    }
}

/// Monotonic `TxnId` source.
///
/// IDs generated within the same millisecond still sort in generation order, which keeps
/// the history index strictly newest-first.
pub struct TxnIdGenerator {
    inner: Mutex<ulid::Generator>,
}

impl TxnIdGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ulid::Generator::new()),
        }
    }

    /// Generate the next identifier.
    pub fn next_id(&self) -> TxnId {
        // The random component only overflows after 2^80 IDs in one millisecond.
        let ulid = self.inner.lock().generate().unwrap_or_else(|_| Ulid::new());
        TxnId(ulid)
    }
}

impl Default for TxnIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TxnIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxnIdGenerator").finish_non_exhaustive()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,

    /// The identifier is empty.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeds its maximum length.
    #[error("identifier longer than {max} bytes")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },

    /// The identifier contains a character outside its alphabet.
    #[error("invalid character {0:?} in identifier")]
    InvalidCharacter(char),
}
