//! History index queries.

use std::collections::HashSet;
use std::sync::Arc;

use fakepay_core::{clamp_limit, HistoryFilter, Result, UpiTransaction, UserId};
use fakepay_store::Store;

use crate::directory::VpaDirectory;

/// Read-only transaction history, newest first.
#[derive(Clone)]
pub struct HistoryIndex {
    store: Arc<dyn Store>,
    directory: VpaDirectory,
}

impl HistoryIndex {
    /// Create the index reader.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, directory: VpaDirectory) -> Self {
        Self { store, directory }
    }

    /// Transactions involving `vpa`. `limit` is clamped to `1..=100` (default 20).
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for a malformed address.
    pub fn query(
        &self,
        vpa: &str,
        limit: Option<usize>,
        filter: HistoryFilter,
    ) -> Result<Vec<UpiTransaction>> {
        let address = self.directory.parse_address(vpa)?;
        Ok(self
            .store
            .list_transactions_by_vpa(&address, filter, clamp_limit(limit))?)
    }

    /// Transactions involving any of the user's addresses, de-duplicated.
    ///
    /// A user with no addresses has an empty history.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn query_user(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
        filter: HistoryFilter,
    ) -> Result<Vec<UpiTransaction>> {
        let limit = clamp_limit(limit);
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for vpa in self.directory.list_by_user(user_id)? {
            for txn in self
                .store
                .list_transactions_by_vpa(&vpa.address, filter, limit)?
            {
                if seen.insert(txn.txn_id) {
                    merged.push(txn);
                }
            }
        }

        // TxnIds are time-ordered.
        merged.sort_by(|a, b| b.txn_id.cmp(&a.txn_id));
        merged.truncate(limit);

        tracing::debug!(
            user_id = %user_id,
            count = merged.len(),
            filter = ?filter,
            "History queried"
        );
        Ok(merged)
    }
}
