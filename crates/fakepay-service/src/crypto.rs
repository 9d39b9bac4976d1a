//! Cryptographic utilities for PIN credentials.
//!
//! PINs are never stored. An enrolled credential keeps a random salt and
//! `HMAC-SHA256(pepper, user_id || ":" || salt || ":" || pin)`, hex-encoded.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated salt in bytes.
pub const SALT_LEN: usize = 16;

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded by
/// the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Generate a fresh hex-encoded salt.
#[must_use]
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Digest of a PIN for one user and salt.
#[must_use]
pub fn pin_digest(pepper: &str, user_id: &str, salt: &str, pin: &str) -> String {
    hmac_sha256_hex(pepper, &format!("{user_id}:{salt}:{pin}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_produces_correct_length() {
        let result = hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog");
        assert_eq!(result.len(), 64);
    }

    #[test]
    fn constant_time_eq_cases() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }

    #[test]
    fn salts_are_random_hex() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_LEN * 2);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn digest_binds_user_salt_and_pin() {
        let base = pin_digest("pepper", "alice", "00", "1234");
        assert_eq!(base, pin_digest("pepper", "alice", "00", "1234"));
        assert_ne!(base, pin_digest("pepper", "bob", "00", "1234"));
        assert_ne!(base, pin_digest("pepper", "alice", "01", "1234"));
        assert_ne!(base, pin_digest("pepper", "alice", "00", "4321"));
        assert_ne!(base, pin_digest("other", "alice", "00", "1234"));
    }
}
