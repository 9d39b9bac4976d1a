//! VPA directory.
//!
//! Maps human-readable addresses to the users who own them. Every address is
//! validated against the provider's fixed domain before it reaches the store.

use std::sync::Arc;

use fakepay_core::{PaymentError, Result, UserId, Vpa, VpaAddress};
use fakepay_store::Store;

/// Address registration and lookup.
#[derive(Clone)]
pub struct VpaDirectory {
    store: Arc<dyn Store>,
    domain: String,
}

impl VpaDirectory {
    /// Create a directory for addresses under `domain`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, domain: impl Into<String>) -> Self {
        Self {
            store,
            domain: domain.into(),
        }
    }

    /// Validate an address against this directory's domain.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` on any syntax violation.
    pub fn parse_address(&self, address: &str) -> Result<VpaAddress> {
        Ok(VpaAddress::parse(address, &self.domain)?)
    }

    /// Register `address` for `user_id`, opening the user's wallet if needed.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` if malformed, `Conflict` if the address is taken.
    pub fn register(&self, user_id: &UserId, address: &str) -> Result<Vpa> {
        let address = self.parse_address(address)?;
        let vpa = Vpa::new(user_id.clone(), address);

        self.store.insert_vpa(&vpa)?;

        tracing::info!(
            user_id = %user_id,
            vpa = %vpa.address,
            vpa_id = %vpa.vpa_id,
            "VPA registered"
        );
        Ok(vpa)
    }

    /// Look up the owner of an address.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` if malformed, `NotFound` if unregistered.
    pub fn resolve(&self, address: &str) -> Result<Vpa> {
        let address = self.parse_address(address)?;
        self.resolve_address(&address)
    }

    /// Look up the owner of an already-validated address.
    ///
    /// # Errors
    ///
    /// `NotFound` if unregistered.
    pub fn resolve_address(&self, address: &VpaAddress) -> Result<Vpa> {
        self.store
            .get_vpa(address)?
            .ok_or_else(|| PaymentError::not_found("vpa", address))
    }

    /// The user's primary (first registered) address.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no address.
    pub fn by_user(&self, user_id: &UserId) -> Result<Vpa> {
        self.list_by_user(user_id)?
            .into_iter()
            .next()
            .ok_or_else(|| PaymentError::not_found("vpa for user", user_id))
    }

    /// All of the user's addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Vpa>> {
        Ok(self.store.list_vpas_by_user(user_id)?)
    }
}
