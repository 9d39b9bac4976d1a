//! Virtual payment addresses.
//!
//! A VPA is a human-readable address (`alice@fakepay`) that resolves to the user who
//! owns the receiving wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{UserId, VpaId};

/// The fixed domain suffix used by this payment provider.
pub const DEFAULT_VPA_DOMAIN: &str = "fakepay";

/// Maximum length of the local part of an address.
pub const MAX_LOCAL_PART_LEN: usize = 64;

/// A syntactically valid VPA address.
///
/// The local part is restricted to lowercase ASCII letters and digits; the domain must
/// equal the provider's configured domain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VpaAddress(String);

impl VpaAddress {
    /// Parse an address against the expected domain.
    ///
    /// # Errors
    ///
    /// Returns `AddressError` if the address is not `<local>@<domain>` with a
    /// lowercase alphanumeric local part.
    pub fn parse(address: &str, domain: &str) -> Result<Self, AddressError> {
        let (local, suffix) = address
            .split_once('@')
            .ok_or(AddressError::MissingDomain)?;

        if suffix != domain {
            return Err(AddressError::WrongDomain {
                expected: domain.to_string(),
            });
        }
        if local.is_empty() {
            return Err(AddressError::EmptyLocalPart);
        }
        if local.len() > MAX_LOCAL_PART_LEN {
            return Err(AddressError::LocalPartTooLong {
                max: MAX_LOCAL_PART_LEN,
            });
        }
        if let Some(c) = local
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        {
            return Err(AddressError::InvalidCharacter(c));
        }

        Ok(Self(address.to_string()))
    }

    /// Wrap an address read back from storage without re-validating it.
    #[must_use]
    pub fn from_trusted(address: String) -> Self {
        Self(address)
    }

    /// Return the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VpaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VpaAddress({})", self.0)
    }
}

impl fmt::Display for VpaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VpaAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A registered VPA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpa {
    /// Unique VPA record ID.
    pub vpa_id: VpaId,

    /// The user who owns this address.
    pub user_id: UserId,

    /// The globally unique address.
    pub address: VpaAddress,

    /// When the address was registered.
    pub created_at: DateTime<Utc>,
}

impl Vpa {
    /// Create a new VPA record for a user.
    #[must_use]
    pub fn new(user_id: UserId, address: VpaAddress) -> Self {
        Self {
            vpa_id: VpaId::generate(),
            user_id,
            address,
            created_at: Utc::now(),
        }
    }
}

/// Reasons an address fails syntax validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// No `@` separator.
    #[error("address must be of the form <name>@<domain>")]
    MissingDomain,

    /// Domain is not the provider's domain.
    #[error("address domain must be @{expected}")]
    WrongDomain {
        /// The required domain.
        expected: String,
    },

    /// Nothing before the `@`.
    #[error("address name is empty")]
    EmptyLocalPart,

    /// Local part is too long.
    #[error("address name longer than {max} characters")]
    LocalPartTooLong {
        /// Maximum allowed length.
        max: usize,
    },

    /// Local part contains a disallowed character.
    #[error("address name may only contain lowercase letters and digits, found {0:?}")]
    InvalidCharacter(char),
}
