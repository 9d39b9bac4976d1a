//! Payment intent store.

use std::sync::Arc;

use fakepay_core::{PaymentError, PaymentId, PaymentIntent, Result};
use fakepay_store::Store;

use crate::directory::VpaDirectory;

/// Payee-side intent creation and lookup.
#[derive(Clone)]
pub struct PaymentIntents {
    store: Arc<dyn Store>,
    directory: VpaDirectory,
}

impl PaymentIntents {
    /// Create the intent store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, directory: VpaDirectory) -> Self {
        Self { store, directory }
    }

    /// Create a `CREATED` intent payable to `payee_vpa`.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, `InvalidAddress`/`NotFound` for the payee,
    /// `InvalidId` for a malformed `payment_id`, `Conflict` if the id is taken.
    pub fn create(
        &self,
        order_id: &str,
        amount: i64,
        payee_vpa: &str,
        payment_id: Option<&str>,
    ) -> Result<PaymentIntent> {
        let payee = self.directory.resolve(payee_vpa)?;
        let payment_id = match payment_id {
            Some(id) => id.parse::<PaymentId>()?,
            None => PaymentId::generate(),
        };

        let intent = PaymentIntent::new(payment_id, order_id.to_string(), amount, payee.address)?;
        self.store.insert_intent(&intent)?;

        tracing::info!(
            payment_id = %intent.payment_id,
            order_id = %intent.order_id,
            amount = intent.amount,
            payee_vpa = %intent.payee_vpa,
            "Payment intent created"
        );
        Ok(intent)
    }

    /// Look up an intent.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub fn get(&self, payment_id: &PaymentId) -> Result<PaymentIntent> {
        self.store
            .get_intent(payment_id)?
            .ok_or_else(|| PaymentError::not_found("payment", payment_id))
    }
}
