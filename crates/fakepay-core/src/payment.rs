//! Payment intents.
//!
//! A payment intent is a payee-issued request for a fixed amount. Its status only moves
//! forward: `CREATED -> PENDING -> COMPLETED | FAILED`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::transaction::TxnStatus;
use crate::{PaymentId, TxnId, VpaAddress};

/// Lifecycle status of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Created by the payee, no payer yet.
    Created,

    /// A transaction has been initiated and awaits confirmation.
    Pending,

    /// Funds moved to the payee.
    Completed,

    /// The attempt failed; the intent cannot be paid again.
    Failed,
}

impl IntentStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Mapping table from transaction status to the intent status it implies.
///
/// | transaction | intent    |
/// |-------------|-----------|
/// | INITIATED   | PENDING   |
/// | SUCCESS     | COMPLETED |
/// | FAILED      | FAILED    |
impl From<TxnStatus> for IntentStatus {
    fn from(status: TxnStatus) -> Self {
        match status {
            TxnStatus::Initiated => Self::Pending,
            TxnStatus::Success => Self::Completed,
            TxnStatus::Failed => Self::Failed,
        }
    }
}

/// A payee-issued request for payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Stable identifier, embedded in payment links and QR codes.
    pub payment_id: PaymentId,

    /// The payee's own order reference.
    pub order_id: String,

    /// Amount in minor units; always positive.
    pub amount: i64,

    /// Where the money goes.
    pub payee_vpa: VpaAddress,

    /// Current status.
    pub status: IntentStatus,

    /// The transaction opened by `initiate`, if any.
    pub txn_id: Option<TxnId>,

    /// The payer that initiated, if any.
    pub payer_vpa: Option<VpaAddress>,

    /// When the intent was created.
    pub created_at: DateTime<Utc>,

    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl PaymentIntent {
    /// Create a new intent in `CREATED` status.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount` is not positive.
    pub fn new(
        payment_id: PaymentId,
        order_id: String,
        amount: i64,
        payee_vpa: VpaAddress,
    ) -> Result<Self, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "payment amount must be positive, got {amount}"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            payment_id,
            order_id,
            amount,
            payee_vpa,
            status: IntentStatus::Created,
            txn_id: None,
            payer_vpa: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Move to `PENDING`, bound to the given transaction and payer.
    ///
    /// # Errors
    ///
    /// `Conflict` unless the intent is `CREATED`.
    pub fn mark_pending(&self, txn_id: TxnId, payer_vpa: VpaAddress) -> Result<Self, PaymentError> {
        if self.status != IntentStatus::Created {
            return Err(PaymentError::Conflict(format!(
                "payment {} is {}",
                self.payment_id,
                self.status.as_str()
            )));
        }
        Ok(Self {
            status: IntentStatus::Pending,
            txn_id: Some(txn_id),
            payer_vpa: Some(payer_vpa),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Move to the terminal status implied by a finalized transaction.
    ///
    /// # Errors
    ///
    /// `Conflict` unless the intent is `PENDING` and `status` is terminal.
    pub fn finalized(&self, status: TxnStatus) -> Result<Self, PaymentError> {
        if self.status != IntentStatus::Pending || !status.is_terminal() {
            return Err(PaymentError::Conflict(format!(
                "payment {} cannot move from {} to {}",
                self.payment_id,
                self.status.as_str(),
                IntentStatus::from(status).as_str()
            )));
        }
        Ok(Self {
            status: status.into(),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }
}
