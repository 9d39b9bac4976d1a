//! Payer credential verification.
//!
//! The demo contract only checks PIN format. With a pepper configured, users may
//! enroll a PIN, which is then checked against its salted hash.

use std::sync::Arc;

use chrono::Utc;

use fakepay_core::{is_well_formed_pin, PaymentError, PinCredential, Result, UserId};
use fakepay_store::Store;

use crate::crypto;

/// Decides whether a submitted credential authorizes a payer.
pub trait CredentialVerifier: Send + Sync {
    /// Whether `pin` is acceptable for `user_id`.
    ///
    /// # Errors
    ///
    /// Store failures only; a wrong PIN is `Ok(false)`.
    fn verify(&self, user_id: &UserId, pin: &str) -> Result<bool>;

    /// Enroll a PIN for `user_id`.
    ///
    /// # Errors
    ///
    /// `BadRequest` when enrollment is unsupported or the PIN is malformed.
    fn enroll(&self, user_id: &UserId, pin: &str) -> Result<()>;
}

/// Accepts any 4 to 6 digit PIN.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatOnly;

impl CredentialVerifier for FormatOnly {
    fn verify(&self, _user_id: &UserId, pin: &str) -> Result<bool> {
        Ok(is_well_formed_pin(pin))
    }

    fn enroll(&self, _user_id: &UserId, _pin: &str) -> Result<()> {
        Err(PaymentError::BadRequest(
            "PIN enrollment is not enabled on this service".into(),
        ))
    }
}

/// Checks PINs against enrolled HMAC digests.
pub struct HashedPin {
    store: Arc<dyn Store>,
    pepper: String,
    require_enrolled: bool,
}

impl HashedPin {
    /// Create a verifier. Users without an enrolled PIN fall back to the format check
    /// unless `require_enrolled` is set.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, pepper: impl Into<String>, require_enrolled: bool) -> Self {
        Self {
            store,
            pepper: pepper.into(),
            require_enrolled,
        }
    }
}

impl CredentialVerifier for HashedPin {
    fn verify(&self, user_id: &UserId, pin: &str) -> Result<bool> {
        if !is_well_formed_pin(pin) {
            return Ok(false);
        }

        match self.store.get_credential(user_id)? {
            Some(credential) => {
                let digest =
                    crypto::pin_digest(&self.pepper, user_id.as_str(), &credential.salt, pin);
                Ok(crypto::constant_time_eq(&digest, &credential.digest))
            }
            None => Ok(!self.require_enrolled),
        }
    }

    fn enroll(&self, user_id: &UserId, pin: &str) -> Result<()> {
        if !is_well_formed_pin(pin) {
            return Err(PaymentError::BadRequest("PIN must be 4 to 6 digits".into()));
        }

        let salt = crypto::generate_salt();
        let digest = crypto::pin_digest(&self.pepper, user_id.as_str(), &salt, pin);
        self.store.put_credential(&PinCredential {
            user_id: user_id.clone(),
            salt,
            digest,
            updated_at: Utc::now(),
        })?;

        tracing::info!(user_id = %user_id, "PIN enrolled");
        Ok(())
    }
}
