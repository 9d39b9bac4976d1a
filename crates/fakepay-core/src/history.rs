//! History query vocabulary.

use serde::{Deserialize, Serialize};

use crate::{UpiTransaction, VpaAddress};

/// Default page size for history queries.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Largest page a history query returns.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Which side of a transaction a history query selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    /// Payer or payee.
    #[default]
    #[serde(alias = "ALL")]
    All,

    /// Payer only.
    #[serde(alias = "SENT")]
    Sent,

    /// Payee only.
    #[serde(alias = "RECEIVED")]
    Received,
}

impl HistoryFilter {
    /// Whether `txn` belongs in a query for the given addresses.
    #[must_use]
    pub fn matches(self, txn: &UpiTransaction, owned: &[VpaAddress]) -> bool {
        let sent = owned.contains(&txn.payer_vpa);
        let received = owned.contains(&txn.payee_vpa);
        match self {
            Self::All => sent || received,
            Self::Sent => sent,
            Self::Received => received,
        }
    }
}

/// Clamp a requested page size to `1..=MAX_HISTORY_LIMIT`.
#[must_use]
pub fn clamp_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}
