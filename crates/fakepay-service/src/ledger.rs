//! Wallet ledger.
//!
//! Every balance change goes through here. Writers for a wallet are serialized by a
//! per-user lock; a transfer takes both users' locks in ascending `UserId` order and
//! then commits both wallets as one store record, guarded by the versions it read.

use std::sync::Arc;

use fakepay_core::{PaymentError, Result, UserId, Wallet};
use fakepay_store::{Settlement, Store, StoreError, TransferCommit, WalletUpdate};

use crate::locks::KeyedLocks;

/// Both sides of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// The debited wallet after the transfer.
    pub from: Wallet,
    /// The credited wallet after the transfer.
    pub to: Wallet,
}

/// Balance operations over the store.
pub struct WalletLedger {
    store: Arc<dyn Store>,
    locks: KeyedLocks<UserId>,
    max_retries: u32,
}

impl WalletLedger {
    /// Create a ledger that retries lost version races `max_retries` times.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, max_retries: u32) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            max_retries,
        }
    }

    /// Credit `amount` to the user's wallet, creating it if needed.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0` or the balance would overflow.
    pub async fn topup(&self, user_id: &UserId, amount: i64) -> Result<Wallet> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "top-up amount must be positive, got {amount}"
            )));
        }

        let _guard = self.locks.lock(user_id).await;

        for attempt in 0..=self.max_retries {
            let wallet = self.store.open_wallet(user_id)?;
            let credited = wallet.credited(amount)?;
            match self.store.update_wallet(&WalletUpdate {
                wallet: credited.clone(),
                expected_version: wallet.version,
            }) {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        amount,
                        balance = credited.balance,
                        "Wallet topped up"
                    );
                    return Ok(credited);
                }
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::warn!(user_id = %user_id, attempt, "Top-up lost a version race");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(self.retries_exhausted(user_id))
    }

    /// Current wallet state.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no wallet.
    pub fn get_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        self.store
            .get_wallet(user_id)?
            .ok_or_else(|| PaymentError::not_found("wallet", user_id))
    }

    /// Current balance in minor units.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no wallet.
    pub fn get_balance(&self, user_id: &UserId) -> Result<i64> {
        Ok(self.get_wallet(user_id)?.balance)
    }

    /// Move `amount` between two wallets.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `SelfTransfer`, `NotFound` (either wallet), `InsufficientFunds`,
    /// or `Internal` after exhausting retries. No balance changes on error.
    pub async fn transfer(
        &self,
        from: &UserId,
        to: &UserId,
        amount: i64,
    ) -> Result<TransferReceipt> {
        self.apply(from, to, amount, |_| Ok(None)).await
    }

    /// Move funds for a payment and finalize its records in the same commit.
    ///
    /// `finalize` runs after the debit is known to succeed and returns the settled
    /// transaction and intent. It may be called again on retry.
    ///
    /// # Errors
    ///
    /// As [`transfer`](Self::transfer), plus `Conflict` if the payment was finalized
    /// concurrently and whatever `finalize` returns.
    pub async fn settle<F>(
        &self,
        from: &UserId,
        to: &UserId,
        amount: i64,
        finalize: F,
    ) -> Result<TransferReceipt>
    where
        F: FnMut(&TransferReceipt) -> Result<Settlement>,
    {
        let mut finalize = finalize;
        self.apply(from, to, amount, |receipt| finalize(receipt).map(Some))
            .await
    }

    async fn apply<F>(
        &self,
        from: &UserId,
        to: &UserId,
        amount: i64,
        mut settlement: F,
    ) -> Result<TransferReceipt>
    where
        F: FnMut(&TransferReceipt) -> Result<Option<Settlement>>,
    {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "transfer amount must be positive, got {amount}"
            )));
        }
        if from == to {
            return Err(PaymentError::SelfTransfer);
        }

        let _guards = self.locks.lock_all(&[from, to]).await;

        for attempt in 0..=self.max_retries {
            let payer = self.get_wallet(from)?;
            let payee = self.get_wallet(to)?;

            let receipt = TransferReceipt {
                from: payer.debited(amount)?,
                to: payee.credited(amount)?,
            };

            let commit = TransferCommit {
                debit: WalletUpdate {
                    wallet: receipt.from.clone(),
                    expected_version: payer.version,
                },
                credit: WalletUpdate {
                    wallet: receipt.to.clone(),
                    expected_version: payee.version,
                },
                settlement: settlement(&receipt)?,
            };

            match self.store.commit_transfer(&commit) {
                Ok(()) => {
                    tracing::info!(
                        from = %from,
                        to = %to,
                        amount,
                        from_balance = receipt.from.balance,
                        to_balance = receipt.to.balance,
                        "Transfer committed"
                    );
                    return Ok(receipt);
                }
                Err(StoreError::VersionConflict {
                    user_id,
                    expected,
                    actual,
                }) => {
                    tracing::warn!(
                        user_id = %user_id,
                        expected,
                        actual,
                        attempt,
                        "Transfer lost a version race, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(self.retries_exhausted(from))
    }

    fn retries_exhausted(&self, user_id: &UserId) -> PaymentError {
        tracing::error!(
            user_id = %user_id,
            retries = self.max_retries,
            "Wallet commit retries exhausted"
        );
        PaymentError::Internal(format!(
            "wallet for {user_id} kept changing; gave up after {} retries",
            self.max_retries
        ))
    }
}
