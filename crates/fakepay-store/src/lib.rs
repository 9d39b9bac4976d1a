//! Storage layer for FakePay.
//!
//! This crate provides persistent storage for VPAs, wallets, payment intents and UPI
//! transactions. Every state transition of the payment core is a single atomic write:
//! a `RocksDB` `WriteBatch` for [`RocksStore`], one critical section for [`MemoryStore`].
//!
//! # Architecture
//!
//! The `RocksDB` backend uses the following column families:
//!
//! - `vpas`: VPA records, keyed by address
//! - `vpas_by_user`: index of addresses per user
//! - `wallets`: wallets, keyed by `user_id`
//! - `payment_intents`: intents, keyed by `payment_id`
//! - `transactions`: UPI transactions, keyed by `txn_id` (ULID)
//! - `transactions_by_vpa`: history index, keyed by `address || txn_id`
//! - `sequences`: named counters for settlement references
//! - `credentials`: enrolled PIN hashes
//!
//! # Example
//!
//! ```no_run
//! use fakepay_store::{RocksStore, Store};
//! use fakepay_core::UserId;
//!
//! let store = RocksStore::open("/tmp/fakepay-db").unwrap();
//!
//! let user_id: UserId = "usr_1".parse().unwrap();
//! let wallet = store.open_wallet(&user_id).unwrap();
//! assert_eq!(wallet.balance, 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;
#[cfg(test)]
mod testing;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use fakepay_core::{
    HistoryFilter, IntentStatus, PaymentId, PaymentIntent, PinCredential, TxnId, TxnStatus,
    UpiTransaction, UserId, Vpa, VpaAddress, Wallet,
};

/// A wallet's new state plus the version the writer read it at.
#[derive(Debug, Clone)]
pub struct WalletUpdate {
    /// State to write.
    pub wallet: Wallet,
    /// Version that must still be stored for the commit to apply.
    pub expected_version: u64,
}

/// Transaction and intent records finalized together with a transfer.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The transaction, now `SUCCESS`.
    pub transaction: UpiTransaction,
    /// The intent, now `COMPLETED`.
    pub intent: PaymentIntent,
}

/// Everything a transfer writes, committed as one record.
#[derive(Debug, Clone)]
pub struct TransferCommit {
    /// The debited wallet.
    pub debit: WalletUpdate,
    /// The credited wallet.
    pub credit: WalletUpdate,
    /// Present when the transfer settles a payment.
    pub settlement: Option<Settlement>,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (`RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // VPA Directory
    // =========================================================================

    /// Insert a VPA, index it under its owner and open the owner's wallet at zero
    /// if there is none, all in one write. An existing wallet is left untouched.
    ///
    /// # Errors
    ///
    /// `StoreError::AlreadyExists` if the address is taken; nothing is written.
    fn insert_vpa(&self, vpa: &Vpa) -> Result<()>;

    /// Get a VPA by address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_vpa(&self, address: &VpaAddress) -> Result<Option<Vpa>>;

    /// List a user's addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_vpas_by_user(&self, user_id: &UserId) -> Result<Vec<Vpa>>;

    // =========================================================================
    // Wallets
    // =========================================================================

    /// Get a wallet by owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>>;

    /// Return the user's wallet, creating an empty one if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn open_wallet(&self, user_id: &UserId) -> Result<Wallet>;

    /// Write a single wallet if its stored version still equals `expected_version`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the wallet doesn't exist.
    /// - `StoreError::VersionConflict` if it changed since it was read.
    fn update_wallet(&self, update: &WalletUpdate) -> Result<()>;

    /// Apply a transfer (and optional settlement) atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if either wallet doesn't exist.
    /// - `StoreError::VersionConflict` if either wallet changed since it was read.
    /// - `StoreError::StateConflict` if the settled transaction is no longer `INITIATED`
    ///   or its intent no longer `PENDING`.
    fn commit_transfer(&self, commit: &TransferCommit) -> Result<()>;

    // =========================================================================
    // Payment Intents
    // =========================================================================

    /// Insert a new intent.
    ///
    /// # Errors
    ///
    /// `StoreError::AlreadyExists` if the payment ID is taken.
    fn insert_intent(&self, intent: &PaymentIntent) -> Result<()>;

    /// Get an intent by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_intent(&self, payment_id: &PaymentId) -> Result<Option<PaymentIntent>>;

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Record a new `INITIATED` transaction, its history index entries, and the
    /// `PENDING` intent in one write.
    ///
    /// # Errors
    ///
    /// `StoreError::StateConflict` if the stored intent is no longer `CREATED`.
    fn open_transaction(&self, transaction: &UpiTransaction, intent: &PaymentIntent)
        -> Result<()>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, txn_id: &TxnId) -> Result<Option<UpiTransaction>>;

    /// Overwrite a still-`INITIATED` transaction (credential attempt counter).
    ///
    /// # Errors
    ///
    /// `StoreError::StateConflict` if the stored transaction is terminal.
    fn update_open_transaction(&self, transaction: &UpiTransaction) -> Result<()>;

    /// Finalize a transaction without moving funds (failure path), together with its
    /// intent.
    ///
    /// # Errors
    ///
    /// `StoreError::StateConflict` if the stored transaction is already terminal.
    fn finalize_transaction(
        &self,
        transaction: &UpiTransaction,
        intent: &PaymentIntent,
    ) -> Result<()>;

    /// List transactions touching an address, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_vpa(
        &self,
        address: &VpaAddress,
        filter: HistoryFilter,
        limit: usize,
    ) -> Result<Vec<UpiTransaction>>;

    // =========================================================================
    // Sequences and Credentials
    // =========================================================================

    /// Allocate the next value (starting at 1) of a named counter. Never returns the
    /// same value twice, across restarts included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn next_sequence(&self, name: &str) -> Result<u64>;

    /// Insert or replace a user's PIN credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_credential(&self, credential: &PinCredential) -> Result<()>;

    /// Get a user's PIN credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_credential(&self, user_id: &UserId) -> Result<Option<PinCredential>>;
}

/// Check that a stored wallet still has the version a writer read.
pub(crate) fn check_version(stored: &Wallet, expected: u64) -> Result<()> {
    if stored.version == expected {
        Ok(())
    } else {
        Err(StoreError::VersionConflict {
            user_id: stored.user_id.to_string(),
            expected,
            actual: stored.version,
        })
    }
}

/// Check that a stored transaction/intent pair can still be finalized.
pub(crate) fn check_open(
    stored_txn: Option<&UpiTransaction>,
    stored_intent: Option<&PaymentIntent>,
    txn_id: &TxnId,
) -> Result<()> {
    let txn = stored_txn.ok_or_else(|| StoreError::NotFound {
        entity: "transaction",
        id: txn_id.to_string(),
    })?;
    if txn.status != TxnStatus::Initiated {
        return Err(StoreError::StateConflict(format!(
            "transaction {txn_id} is {}",
            txn.status.as_str()
        )));
    }
    let intent = stored_intent.ok_or_else(|| StoreError::NotFound {
        entity: "payment",
        id: txn.payment_id.to_string(),
    })?;
    if intent.status != IntentStatus::Pending {
        return Err(StoreError::StateConflict(format!(
            "payment {} is {}",
            intent.payment_id,
            intent.status.as_str()
        )));
    }
    Ok(())
}
