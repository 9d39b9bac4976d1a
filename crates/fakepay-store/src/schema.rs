//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// VPA records, keyed by address.
    pub const VPAS: &str = "vpas";

    /// Index: addresses by owner, keyed by `user_id || address`. Value is empty.
    pub const VPAS_BY_USER: &str = "vpas_by_user";

    /// Wallets, keyed by `user_id`.
    pub const WALLETS: &str = "wallets";

    /// Payment intents, keyed by `payment_id`.
    pub const INTENTS: &str = "payment_intents";

    /// UPI transactions, keyed by `txn_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by VPA, keyed by `address || txn_id`.
    /// Value is a single role byte (see [`crate::keys::Role`]).
    pub const TRANSACTIONS_BY_VPA: &str = "transactions_by_vpa";

    /// Named monotonic counters (settlement references).
    pub const SEQUENCES: &str = "sequences";

    /// Enrolled PIN credentials, keyed by `user_id`.
    pub const CREDENTIALS: &str = "credentials";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::VPAS,
        cf::VPAS_BY_USER,
        cf::WALLETS,
        cf::INTENTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_VPA,
        cf::SEQUENCES,
        cf::CREDENTIALS,
    ]
}
