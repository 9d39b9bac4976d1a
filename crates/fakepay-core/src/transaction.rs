//! UPI transactions.
//!
//! One transaction records one attempt to pay a payment intent. Records are never
//! deleted; once `SUCCESS` or `FAILED` they never change again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::settlement::SettlementRef;
use crate::{PaymentId, PaymentIntent, TxnId, VpaAddress};

/// Status of a UPI transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnStatus {
    /// Opened by `initiate`, waiting for the payer's credential.
    #[serde(alias = "PENDING")]
    Initiated,

    /// Funds moved; carries a settlement reference.
    Success,

    /// The attempt failed; no funds moved.
    Failed,
}

impl TxnStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// Why a transaction ended in `FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The payer's balance could not cover the amount.
    InsufficientFunds,

    /// Too many rejected credentials.
    CredentialLocked,
}

/// A single UPI transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpiTransaction {
    /// Time-ordered ID.
    pub txn_id: TxnId,

    /// The intent being paid.
    pub payment_id: PaymentId,

    /// Debited address.
    pub payer_vpa: VpaAddress,

    /// Credited address.
    pub payee_vpa: VpaAddress,

    /// Amount in minor units.
    pub amount: i64,

    /// Current status.
    pub status: TxnStatus,

    /// UTR, present only on `SUCCESS`.
    pub settlement_ref: Option<SettlementRef>,

    /// Present only on `FAILED`.
    pub failure_reason: Option<FailureReason>,

    /// Rejected credential submissions so far.
    pub credential_attempts: u32,

    /// Free-form note (the payee's order reference).
    pub note: Option<String>,

    /// Creation time, equal to the timestamp in `txn_id`.
    pub created_at: DateTime<Utc>,

    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl UpiTransaction {
    /// Open a transaction against an intent.
    #[must_use]
    pub fn initiate(txn_id: TxnId, intent: &PaymentIntent, payer_vpa: VpaAddress) -> Self {
        let created_at = txn_id.created_at();
        Self {
            txn_id,
            payment_id: intent.payment_id.clone(),
            payer_vpa,
            payee_vpa: intent.payee_vpa.clone(),
            amount: intent.amount,
            status: TxnStatus::Initiated,
            settlement_ref: None,
            failure_reason: None,
            credential_attempts: 0,
            note: Some(intent.order_id.clone()),
            created_at,
            updated_at: created_at,
        }
    }

    /// Finalize as `SUCCESS`.
    ///
    /// # Errors
    ///
    /// `Conflict` if already terminal.
    pub fn succeeded(&self, settlement_ref: SettlementRef) -> Result<Self, PaymentError> {
        self.ensure_open()?;
        Ok(Self {
            status: TxnStatus::Success,
            settlement_ref: Some(settlement_ref),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Finalize as `FAILED`.
    ///
    /// # Errors
    ///
    /// `Conflict` if already terminal.
    pub fn failed(&self, reason: FailureReason) -> Result<Self, PaymentError> {
        self.ensure_open()?;
        Ok(Self {
            status: TxnStatus::Failed,
            failure_reason: Some(reason),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Count one rejected credential.
    #[must_use]
    pub fn with_rejected_credential(&self) -> Self {
        Self {
            credential_attempts: self.credential_attempts.saturating_add(1),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    fn ensure_open(&self) -> Result<(), PaymentError> {
        if self.status.is_terminal() {
            return Err(PaymentError::Conflict(format!(
                "transaction {} is already {}",
                self.txn_id,
                self.status.as_str()
            )));
        }
        Ok(())
    }
}
