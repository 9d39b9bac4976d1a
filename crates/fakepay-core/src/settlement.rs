//! Settlement references (UTR).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique reference assigned to a settled transfer.
///
/// Formatted as `YYDDD` (two-digit year, day of year) followed by the zero-padded
/// global settlement sequence, giving a 12-digit reference until the sequence passes
/// ten million.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementRef(String);

impl SettlementRef {
    /// Build the reference for a sequence number allocated at `at`.
    #[must_use]
    pub fn allocate(sequence: u64, at: DateTime<Utc>) -> Self {
        Self(format!("{}{sequence:07}", at.format("%y%j")))
    }

    /// Return the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SettlementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SettlementRef({})", self.0)
    }
}

impl fmt::Display for SettlementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
