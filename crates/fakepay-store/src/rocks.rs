//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//!
//! Writes that depend on what is currently stored (version checks, status checks,
//! counters) read and write under one process-wide write lock and commit as a single
//! `WriteBatch`, so a crash never leaves half a transfer behind.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use fakepay_core::{
    HistoryFilter, IntentStatus, PaymentId, PaymentIntent, PinCredential, TxnId, TxnStatus,
    UpiTransaction, UserId, Vpa, VpaAddress, Wallet,
};

use crate::error::{Result, StoreError};
use crate::keys::{self, Role};
use crate::schema::{all_column_families, cf};
use crate::{check_open, check_version, Store, TransferCommit, WalletUpdate};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(StoreError::database)?;

        tracing::info!(path = %path.as_ref().display(), "opened rocksdb store");

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(StoreError::database)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch).map_err(StoreError::database)
    }

    fn stored_wallet(&self, update: &WalletUpdate) -> Result<Wallet> {
        let user_id = &update.wallet.user_id;
        let stored: Wallet = self
            .get(cf::WALLETS, &keys::wallet_key(user_id))?
            .ok_or_else(|| StoreError::NotFound {
                entity: "wallet",
                id: user_id.to_string(),
            })?;
        check_version(&stored, update.expected_version)?;
        Ok(stored)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // VPA Directory
    // =========================================================================

    fn insert_vpa(&self, vpa: &Vpa) -> Result<()> {
        let _guard = self.write_lock.lock();

        let cf_vpas = self.cf(cf::VPAS)?;
        let cf_by_user = self.cf(cf::VPAS_BY_USER)?;
        let key = keys::vpa_key(&vpa.address);

        if self
            .db
            .get_cf(&cf_vpas, &key)
            .map_err(StoreError::database)?
            .is_some()
        {
            return Err(StoreError::AlreadyExists {
                entity: "vpa",
                id: vpa.address.to_string(),
            });
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_vpas, &key, Self::serialize(vpa)?);
        batch.put_cf(&cf_by_user, keys::user_vpa_key(&vpa.user_id, &vpa.address), []);
        if self.get_wallet(&vpa.user_id)?.is_none() {
            let cf_wallets = self.cf(cf::WALLETS)?;
            batch.put_cf(
                &cf_wallets,
                keys::wallet_key(&vpa.user_id),
                Self::serialize(&Wallet::open(vpa.user_id.clone()))?,
            );
        }
        self.write(batch)
    }

    fn get_vpa(&self, address: &VpaAddress) -> Result<Option<Vpa>> {
        self.get(cf::VPAS, &keys::vpa_key(address))
    }

    fn list_vpas_by_user(&self, user_id: &UserId) -> Result<Vec<Vpa>> {
        let cf_by_user = self.cf(cf::VPAS_BY_USER)?;
        let prefix = keys::user_vpas_prefix(user_id);

        let iter = self
            .db
            .iterator_cf(&cf_by_user, IteratorMode::From(&prefix, Direction::Forward));

        let mut vpas = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(StoreError::database)?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some(address) = keys::extract_address_from_user_key(&key, prefix.len()) else {
                continue;
            };
            if let Some(vpa) = self.get_vpa(&address)? {
                vpas.push(vpa);
            }
        }

        // Index order is by address; callers want registration order.
        vpas.sort_by_key(|v| v.created_at);
        Ok(vpas)
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>> {
        self.get(cf::WALLETS, &keys::wallet_key(user_id))
    }

    fn open_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        let _guard = self.write_lock.lock();

        if let Some(wallet) = self.get_wallet(user_id)? {
            return Ok(wallet);
        }

        let wallet = Wallet::open(user_id.clone());
        let cf = self.cf(cf::WALLETS)?;
        self.db
            .put_cf(&cf, keys::wallet_key(user_id), Self::serialize(&wallet)?)
            .map_err(StoreError::database)?;
        Ok(wallet)
    }

    fn update_wallet(&self, update: &WalletUpdate) -> Result<()> {
        let _guard = self.write_lock.lock();

        self.stored_wallet(update)?;

        let cf = self.cf(cf::WALLETS)?;
        self.db
            .put_cf(
                &cf,
                keys::wallet_key(&update.wallet.user_id),
                Self::serialize(&update.wallet)?,
            )
            .map_err(StoreError::database)
    }

    fn commit_transfer(&self, commit: &TransferCommit) -> Result<()> {
        if commit.debit.wallet.user_id == commit.credit.wallet.user_id {
            return Err(StoreError::StateConflict(
                "transfer debits and credits the same wallet".into(),
            ));
        }

        let _guard = self.write_lock.lock();

        self.stored_wallet(&commit.debit)?;
        self.stored_wallet(&commit.credit)?;

        let cf_wallets = self.cf(cf::WALLETS)?;
        let mut batch = WriteBatch::default();
        for update in [&commit.debit, &commit.credit] {
            batch.put_cf(
                &cf_wallets,
                keys::wallet_key(&update.wallet.user_id),
                Self::serialize(&update.wallet)?,
            );
        }

        if let Some(settlement) = &commit.settlement {
            let txn = &settlement.transaction;
            let stored_txn: Option<UpiTransaction> =
                self.get(cf::TRANSACTIONS, &keys::transaction_key(&txn.txn_id))?;
            let stored_intent: Option<PaymentIntent> =
                self.get(cf::INTENTS, settlement.intent.payment_id.as_bytes())?;
            check_open(stored_txn.as_ref(), stored_intent.as_ref(), &txn.txn_id)?;

            let cf_tx = self.cf(cf::TRANSACTIONS)?;
            let cf_intents = self.cf(cf::INTENTS)?;
            batch.put_cf(&cf_tx, keys::transaction_key(&txn.txn_id), Self::serialize(txn)?);
            batch.put_cf(
                &cf_intents,
                settlement.intent.payment_id.as_bytes(),
                Self::serialize(&settlement.intent)?,
            );
        }

        self.write(batch)
    }

    // =========================================================================
    // Payment Intents
    // =========================================================================

    fn insert_intent(&self, intent: &PaymentIntent) -> Result<()> {
        let _guard = self.write_lock.lock();

        let cf = self.cf(cf::INTENTS)?;
        let key = intent.payment_id.as_bytes();
        if self
            .db
            .get_cf(&cf, key)
            .map_err(StoreError::database)?
            .is_some()
        {
            return Err(StoreError::AlreadyExists {
                entity: "payment",
                id: intent.payment_id.to_string(),
            });
        }

        self.db
            .put_cf(&cf, key, Self::serialize(intent)?)
            .map_err(StoreError::database)
    }

    fn get_intent(&self, payment_id: &PaymentId) -> Result<Option<PaymentIntent>> {
        self.get(cf::INTENTS, payment_id.as_bytes())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    fn open_transaction(
        &self,
        transaction: &UpiTransaction,
        intent: &PaymentIntent,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();

        let stored: PaymentIntent =
            self.get(cf::INTENTS, intent.payment_id.as_bytes())?
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

        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_vpa = self.cf(cf::TRANSACTIONS_BY_VPA)?;
        let cf_intents = self.cf(cf::INTENTS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&transaction.txn_id),
            Self::serialize(transaction)?,
        );
        for vpa in [&transaction.payer_vpa, &transaction.payee_vpa] {
            batch.put_cf(
                &cf_by_vpa,
                keys::vpa_transaction_key(vpa, &transaction.txn_id),
                [Role::of(transaction, vpa).to_byte()],
            );
        }
        batch.put_cf(&cf_intents, intent.payment_id.as_bytes(), Self::serialize(intent)?);

        self.write(batch)
    }

    fn get_transaction(&self, txn_id: &TxnId) -> Result<Option<UpiTransaction>> {
        self.get(cf::TRANSACTIONS, &keys::transaction_key(txn_id))
    }

    fn update_open_transaction(&self, transaction: &UpiTransaction) -> Result<()> {
        let _guard = self.write_lock.lock();

        let stored = self
            .get_transaction(&transaction.txn_id)?
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

        let cf = self.cf(cf::TRANSACTIONS)?;
        self.db
            .put_cf(
                &cf,
                keys::transaction_key(&transaction.txn_id),
                Self::serialize(transaction)?,
            )
            .map_err(StoreError::database)
    }

    fn finalize_transaction(
        &self,
        transaction: &UpiTransaction,
        intent: &PaymentIntent,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();

        let stored_txn = self.get_transaction(&transaction.txn_id)?;
        let stored_intent = self.get_intent(&intent.payment_id)?;
        check_open(stored_txn.as_ref(), stored_intent.as_ref(), &transaction.txn_id)?;

        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_intents = self.cf(cf::INTENTS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&transaction.txn_id),
            Self::serialize(transaction)?,
        );
        batch.put_cf(&cf_intents, intent.payment_id.as_bytes(), Self::serialize(intent)?);

        self.write(batch)
    }

    fn list_transactions_by_vpa(
        &self,
        address: &VpaAddress,
        filter: HistoryFilter,
        limit: usize,
    ) -> Result<Vec<UpiTransaction>> {
        let cf_by_vpa = self.cf(cf::TRANSACTIONS_BY_VPA)?;
        let prefix = keys::vpa_transactions_prefix(address);
        let upper = keys::vpa_transactions_upper_bound(address);

        // ULID keys sort by creation time, so walking backwards yields newest first.
        let iter = self
            .db
            .iterator_cf(&cf_by_vpa, IteratorMode::From(&upper, Direction::Reverse));

        let mut transactions = Vec::new();
        for item in iter {
            if transactions.len() >= limit {
                break;
            }

            let (key, value) = item.map_err(StoreError::database)?;
            if !key.starts_with(&prefix) {
                break;
            }

            let role = Role::from_byte(value.first().copied().unwrap_or_default());
            let wanted = match filter {
                HistoryFilter::All => true,
                HistoryFilter::Sent => role.is_payer(),
                HistoryFilter::Received => role.is_payee(),
            };
            if !wanted {
                continue;
            }

            let Some(txn_id) = keys::extract_txn_id(&key) else {
                continue;
            };
            if let Some(txn) = self.get_transaction(&txn_id)? {
                transactions.push(txn);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Sequences and Credentials
    // =========================================================================

    fn next_sequence(&self, name: &str) -> Result<u64> {
        let _guard = self.write_lock.lock();

        let cf = self.cf(cf::SEQUENCES)?;
        let current = self
            .db
            .get_cf(&cf, name.as_bytes())
            .map_err(StoreError::database)?
            .map(|data| {
                <[u8; 8]>::try_from(data.as_slice())
                    .map(u64::from_be_bytes)
                    .map_err(|_| StoreError::Serialization(format!("corrupt sequence: {name}")))
            })
            .transpose()?
            .unwrap_or(0);

        let next = current + 1;
        self.db
            .put_cf(&cf, name.as_bytes(), next.to_be_bytes())
            .map_err(StoreError::database)?;
        Ok(next)
    }

    fn put_credential(&self, credential: &PinCredential) -> Result<()> {
        let cf = self.cf(cf::CREDENTIALS)?;
        self.db
            .put_cf(
                &cf,
                keys::wallet_key(&credential.user_id),
                Self::serialize(credential)?,
            )
            .map_err(StoreError::database)
    }

    fn get_credential(&self, user_id: &UserId) -> Result<Option<PinCredential>> {
        self.get(cf::CREDENTIALS, &keys::wallet_key(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn vpa_directory() {
        let (store, _dir) = create_test_store();
        testing::vpa_directory(&store);
    }

    #[test]
    fn wallet_versions() {
        let (store, _dir) = create_test_store();
        testing::wallet_versions(&store);
    }

    #[test]
    fn transfer_with_settlement() {
        let (store, _dir) = create_test_store();
        testing::transfer_with_settlement(&store);
    }

    #[test]
    fn stale_transfer_is_rejected() {
        let (store, _dir) = create_test_store();
        testing::stale_transfer_is_rejected(&store);
    }

    #[test]
    fn open_transaction_requires_created_intent() {
        let (store, _dir) = create_test_store();
        testing::open_transaction_requires_created_intent(&store);
    }

    #[test]
    fn history_is_newest_first_and_filtered() {
        let (store, _dir) = create_test_store();
        testing::history_is_newest_first_and_filtered(&store);
    }

    #[test]
    fn finalize_is_single_shot() {
        let (store, _dir) = create_test_store();
        testing::finalize_is_single_shot(&store);
    }

    #[test]
    fn sequences_and_credentials() {
        let (store, _dir) = create_test_store();
        testing::sequences_and_credentials(&store);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let user: UserId = "usr_1".parse().unwrap();

        {
            let store = RocksStore::open(dir.path()).unwrap();
            let wallet = store.open_wallet(&user).unwrap();
            store
                .update_wallet(&WalletUpdate {
                    wallet: wallet.credited(5000).unwrap(),
                    expected_version: wallet.version,
                })
                .unwrap();
            assert_eq!(store.next_sequence("utr").unwrap(), 1);
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let wallet = store.get_wallet(&user).unwrap().unwrap();
        assert_eq!(wallet.balance, 5000);
        assert_eq!(wallet.version, 1);
        assert_eq!(store.next_sequence("utr").unwrap(), 2);
    }
}
