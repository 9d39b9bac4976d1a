//! Enrolled payment credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user's enrolled PIN, stored only as a salted keyed hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinCredential {
    /// Owning user.
    pub user_id: UserId,

    /// Hex-encoded random salt.
    pub salt: String,

    /// Hex-encoded HMAC-SHA256 digest.
    pub digest: String,

    /// When the PIN was set.
    pub updated_at: DateTime<Utc>,
}

/// Check the demo credential format: 4 to 6 ASCII digits.
#[must_use]
pub fn is_well_formed_pin(pin: &str) -> bool {
    (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}
