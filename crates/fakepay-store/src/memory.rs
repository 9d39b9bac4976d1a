//! In-memory storage implementation.
//!
//! Used by tests and by `STORAGE_BACKEND=memory`. All state sits behind a single
//! `RwLock`, so every trait method is atomic with respect to every other.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use fakepay_core::{
    HistoryFilter, IntentStatus, PaymentId, PaymentIntent, PinCredential, TxnId, TxnStatus,
    UpiTransaction, UserId, Vpa, VpaAddress, Wallet,
};

use crate::error::{Result, StoreError};
use crate::{check_open, check_version, Store, TransferCommit, WalletUpdate};

#[derive(Default)]
struct Tables {
    vpas: HashMap<VpaAddress, Vpa>,
    wallets: HashMap<UserId, Wallet>,
    intents: HashMap<PaymentId, PaymentIntent>,
    // Keyed by ULID, so iteration order is creation order.
    transactions: BTreeMap<TxnId, UpiTransaction>,
    sequences: HashMap<String, u64>,
    credentials: HashMap<UserId, PinCredential>,
}

impl Tables {
    fn checked_wallet(&self, update: &WalletUpdate) -> Result<()> {
        let stored = self
            .wallets
            .get(&update.wallet.user_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "wallet",
                id: update.wallet.user_id.to_string(),
            })?;
        check_version(stored, update.expected_version)
    }
}

/// Volatile storage backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn insert_vpa(&self, vpa: &Vpa) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.vpas.contains_key(&vpa.address) {
            return Err(StoreError::AlreadyExists {
                entity: "vpa",
                id: vpa.address.to_string(),
            });
        }
        tables.vpas.insert(vpa.address.clone(), vpa.clone());
        tables
            .wallets
            .entry(vpa.user_id.clone())
            .or_insert_with(|| Wallet::open(vpa.user_id.clone()));
        Ok(())
    }

    fn get_vpa(&self, address: &VpaAddress) -> Result<Option<Vpa>> {
        Ok(self.tables.read().vpas.get(address).cloned())
    }

    fn list_vpas_by_user(&self, user_id: &UserId) -> Result<Vec<Vpa>> {
        let mut vpas: Vec<Vpa> = self
            .tables
            .read()
            .vpas
            .values()
            .filter(|v| &v.user_id == user_id)
            .cloned()
            .collect();
        vpas.sort_by_key(|v| v.created_at);
        Ok(vpas)
    }

    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>> {
        Ok(self.tables.read().wallets.get(user_id).cloned())
    }

    fn open_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        let mut tables = self.tables.write();
        Ok(tables
            .wallets
            .entry(user_id.clone())
            .or_insert_with(|| Wallet::open(user_id.clone()))
            .clone())
    }

    fn update_wallet(&self, update: &WalletUpdate) -> Result<()> {
        let mut tables = self.tables.write();
        tables.checked_wallet(update)?;
        tables
            .wallets
            .insert(update.wallet.user_id.clone(), update.wallet.clone());
        Ok(())
    }

    fn commit_transfer(&self, commit: &TransferCommit) -> Result<()> {
        if commit.debit.wallet.user_id == commit.credit.wallet.user_id {
            return Err(StoreError::StateConflict(
                "transfer debits and credits the same wallet".into(),
            ));
        }

        let mut tables = self.tables.write();
        tables.checked_wallet(&commit.debit)?;
        tables.checked_wallet(&commit.credit)?;
        if let Some(settlement) = &commit.settlement {
            let txn_id = &settlement.transaction.txn_id;
            check_open(
                tables.transactions.get(txn_id),
                tables.intents.get(&settlement.intent.payment_id),
                txn_id,
            )?;
        }

        for update in [&commit.debit, &commit.credit] {
            tables
                .wallets
                .insert(update.wallet.user_id.clone(), update.wallet.clone());
        }
        if let Some(settlement) = &commit.settlement {
            tables
                .transactions
                .insert(settlement.transaction.txn_id, settlement.transaction.clone());
            tables
                .intents
                .insert(settlement.intent.payment_id.clone(), settlement.intent.clone());
        }
        Ok(())
    }

    fn insert_intent(&self, intent: &PaymentIntent) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.intents.contains_key(&intent.payment_id) {
            return Err(StoreError::AlreadyExists {
                entity: "payment",
                id: intent.payment_id.to_string(),
            });
        }
        tables
            .intents
            .insert(intent.payment_id.clone(), intent.clone());
        Ok(())
    }

    fn get_intent(&self, payment_id: &PaymentId) -> Result<Option<PaymentIntent>> {
        Ok(self.tables.read().intents.get(payment_id).cloned())
    }

    fn open_transaction(
        &self,
        transaction: &UpiTransaction,
        intent: &PaymentIntent,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .intents
            .get(&intent.payment_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "payment",
                id: intent.payment_id.to_string(),
            })?;
        if stored.status != IntentStatus::Created {
            return Err(StoreError::StateConflict(format!(
                "payment {} is {}",
                stored.payment_id,
                stored.status.as_str()
            )));
        }

        tables
            .transactions
            .insert(transaction.txn_id, transaction.clone());
        tables
            .intents
            .insert(intent.payment_id.clone(), intent.clone());
        Ok(())
    }

    fn get_transaction(&self, txn_id: &TxnId) -> Result<Option<UpiTransaction>> {
        Ok(self.tables.read().transactions.get(txn_id).cloned())
    }

    fn update_open_transaction(&self, transaction: &UpiTransaction) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .transactions
            .get_mut(&transaction.txn_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "transaction",
                id: transaction.txn_id.to_string(),
            })?;
        if stored.status != TxnStatus::Initiated {
            return Err(StoreError::StateConflict(format!(
                "transaction {} is {}",
                stored.txn_id,
                stored.status.as_str()
            )));
        }
        *stored = transaction.clone();
        Ok(())
    }

    fn finalize_transaction(
        &self,
        transaction: &UpiTransaction,
        intent: &PaymentIntent,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        check_open(
            tables.transactions.get(&transaction.txn_id),
            tables.intents.get(&intent.payment_id),
            &transaction.txn_id,
        )?;
        tables
            .transactions
            .insert(transaction.txn_id, transaction.clone());
        tables
            .intents
            .insert(intent.payment_id.clone(), intent.clone());
        Ok(())
    }

    fn list_transactions_by_vpa(
        &self,
        address: &VpaAddress,
        filter: HistoryFilter,
        limit: usize,
    ) -> Result<Vec<UpiTransaction>> {
        let owned = std::slice::from_ref(address);
        Ok(self
            .tables
            .read()
            .transactions
            .values()
            .rev()
            .filter(|txn| filter.matches(txn, owned))
            .take(limit)
            .cloned()
            .collect())
    }

    fn next_sequence(&self, name: &str) -> Result<u64> {
        let mut tables = self.tables.write();
        let counter = tables.sequences.entry(name.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn put_credential(&self, credential: &PinCredential) -> Result<()> {
        self.tables
            .write()
            .credentials
            .insert(credential.user_id.clone(), credential.clone());
        Ok(())
    }

    fn get_credential(&self, user_id: &UserId) -> Result<Option<PinCredential>> {
        Ok(self.tables.read().credentials.get(user_id).cloned())
    }
}
