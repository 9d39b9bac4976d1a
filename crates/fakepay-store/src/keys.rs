//! Key encoding utilities for `RocksDB`.
//!
//! Variable-length components are prefixed with their length (u16, big-endian) so that
//! one address or user can never be a byte-prefix of another.

use fakepay_core::{TxnId, UpiTransaction, UserId, VpaAddress};

/// Which side(s) of a transaction an index entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role(u8);

impl Role {
    const PAYER: u8 = 0b01;
    const PAYEE: u8 = 0b10;

    /// Role of `vpa` in `txn`.
    #[must_use]
    pub fn of(txn: &UpiTransaction, vpa: &VpaAddress) -> Self {
        let mut bits = 0;
        if &txn.payer_vpa == vpa {
            bits |= Self::PAYER;
        }
        if &txn.payee_vpa == vpa {
            bits |= Self::PAYEE;
        }
        Self(bits)
    }

    /// Decode from an index value.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Encode as an index value.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// The indexed VPA paid.
    #[must_use]
    pub const fn is_payer(self) -> bool {
        self.0 & Self::PAYER != 0
    }

    /// The indexed VPA was paid.
    #[must_use]
    pub const fn is_payee(self) -> bool {
        self.0 & Self::PAYEE != 0
    }
}

fn length_prefixed(bytes: &[u8], extra: usize) -> Vec<u8> {
    // Ids and addresses are validated far below u16::MAX.
    let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
    let mut key = Vec::with_capacity(2 + bytes.len() + extra);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(bytes);
    key
}

/// Create a VPA key from an address.
#[must_use]
pub fn vpa_key(address: &VpaAddress) -> Vec<u8> {
    address.as_str().as_bytes().to_vec()
}

/// Prefix for all addresses owned by a user.
#[must_use]
pub fn user_vpas_prefix(user_id: &UserId) -> Vec<u8> {
    length_prefixed(user_id.as_bytes(), 0)
}

/// Index key `len(user) || user || address`.
#[must_use]
pub fn user_vpa_key(user_id: &UserId, address: &VpaAddress) -> Vec<u8> {
    let mut key = length_prefixed(user_id.as_bytes(), address.as_str().len());
    key.extend_from_slice(address.as_str().as_bytes());
    key
}

/// Extract the address from a user-VPA index key.
#[must_use]
pub fn extract_address_from_user_key(key: &[u8], prefix_len: usize) -> Option<VpaAddress> {
    let tail = key.get(prefix_len..)?;
    std::str::from_utf8(tail)
        .ok()
        .map(|s| VpaAddress::from_trusted(s.to_string()))
}

/// Create a wallet key from a user ID.
#[must_use]
pub fn wallet_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(txn_id: &TxnId) -> Vec<u8> {
    txn_id.to_bytes().to_vec()
}

/// Prefix for all index entries of an address.
#[must_use]
pub fn vpa_transactions_prefix(address: &VpaAddress) -> Vec<u8> {
    length_prefixed(address.as_str().as_bytes(), 0)
}

/// Index key `len(address) || address || txn_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, entries for an address sort by creation time.
#[must_use]
pub fn vpa_transaction_key(address: &VpaAddress, txn_id: &TxnId) -> Vec<u8> {
    let mut key = length_prefixed(address.as_str().as_bytes(), 16);
    key.extend_from_slice(&txn_id.to_bytes());
    key
}

/// The last possible index key for an address, used to seek backwards.
#[must_use]
pub fn vpa_transactions_upper_bound(address: &VpaAddress) -> Vec<u8> {
    let mut key = vpa_transactions_prefix(address);
    key.extend_from_slice(&[0xFF; 16]);
    key
}

/// Extract the transaction ID from the last 16 bytes of an index key.
#[must_use]
pub fn extract_txn_id(key: &[u8]) -> Option<TxnId> {
    let start = key.len().checked_sub(16)?;
    let bytes: [u8; 16] = key[start..].try_into().ok()?;
    Some(TxnId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakepay_core::{TxnIdGenerator, DEFAULT_VPA_DOMAIN};

    fn vpa(s: &str) -> VpaAddress {
        VpaAddress::parse(s, DEFAULT_VPA_DOMAIN).unwrap()
    }

    #[test]
    fn vpa_transaction_key_format() {
        let address = vpa("alice@fakepay");
        let txn_id = TxnIdGenerator::new().next_id();
        let key = vpa_transaction_key(&address, &txn_id);

        assert_eq!(key.len(), 2 + "alice@fakepay".len() + 16);
        assert!(key.starts_with(&vpa_transactions_prefix(&address)));
        assert_eq!(extract_txn_id(&key), Some(txn_id));
    }

    #[test]
    fn prefixes_do_not_overlap() {
        let a = vpa_transactions_prefix(&vpa("ab@fakepay"));
        let key = vpa_transaction_key(&vpa("abc@fakepay"), &TxnIdGenerator::new().next_id());
        assert!(!key.starts_with(&a));
    }

    #[test]
    fn upper_bound_sorts_after_every_entry() {
        let address = vpa("alice@fakepay");
        let key = vpa_transaction_key(&address, &TxnIdGenerator::new().next_id());
        assert!(key < vpa_transactions_upper_bound(&address));
    }

    #[test]
    fn user_vpa_key_roundtrip() {
        let user: UserId = "usr_1".parse().unwrap();
        let address = vpa("alice@fakepay");
        let key = user_vpa_key(&user, &address);
        let prefix = user_vpas_prefix(&user);
        assert!(key.starts_with(&prefix));
        assert_eq!(extract_address_from_user_key(&key, prefix.len()), Some(address));
    }

    #[test]
    fn role_bits() {
        let role = Role::from_byte(0b01);
        assert!(role.is_payer());
        assert!(!role.is_payee());
        assert_eq!(Role::from_byte(role.to_byte()), role);
    }
}
