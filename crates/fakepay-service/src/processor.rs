//! Transaction processor.
//!
//! Drives the payment state machine:
//!
//! ```text
//! intent:      CREATED --initiate--> PENDING --confirm--> COMPLETED | FAILED
//! transaction:           (created)   INITIATED --confirm--> SUCCESS | FAILED
//! ```
//!
//! `initiate` is serialized per payment and `confirm` per transaction. Both are
//! idempotent: repeating `initiate` while `PENDING` returns the open transaction, and
//! repeating `confirm` after a terminal status returns the stored outcome without
//! touching the ledger.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use fakepay_core::{
    FailureReason, IntentStatus, PaymentError, PaymentId, Result, SettlementRef, TxnId,
    TxnIdGenerator, TxnStatus, UpiTransaction,
};
use fakepay_store::{Settlement, Store};

use crate::credentials::CredentialVerifier;
use crate::directory::VpaDirectory;
use crate::intents::PaymentIntents;
use crate::ledger::WalletLedger;
use crate::locks::KeyedLocks;

/// Sequence that numbers settlement references.
pub const SETTLEMENT_SEQUENCE: &str = "settlement_ref";

/// Result of a confirmation, fresh or replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOutcome {
    /// The confirmed transaction.
    pub txn_id: TxnId,
    /// The intent it paid.
    pub payment_id: PaymentId,
    /// `SUCCESS` or `FAILED`.
    pub status: TxnStatus,
    /// UTR, on success only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<SettlementRef>,
    /// Why the payment failed, on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl From<&UpiTransaction> for ConfirmOutcome {
    fn from(txn: &UpiTransaction) -> Self {
        Self {
            txn_id: txn.txn_id,
            payment_id: txn.payment_id.clone(),
            status: txn.status,
            settlement_ref: txn.settlement_ref.clone(),
            failure_reason: txn.failure_reason,
        }
    }
}

/// Initiates and confirms UPI transactions against payment intents.
pub struct TransactionProcessor {
    store: Arc<dyn Store>,
    directory: VpaDirectory,
    intents: PaymentIntents,
    ledger: Arc<WalletLedger>,
    verifier: Arc<dyn CredentialVerifier>,
    ids: TxnIdGenerator,
    payment_locks: KeyedLocks<PaymentId>,
    txn_locks: KeyedLocks<TxnId>,
    max_credential_attempts: u32,
}

impl TransactionProcessor {
    /// Create a processor.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        directory: VpaDirectory,
        intents: PaymentIntents,
        ledger: Arc<WalletLedger>,
        verifier: Arc<dyn CredentialVerifier>,
        max_credential_attempts: u32,
    ) -> Self {
        Self {
            store,
            directory,
            intents,
            ledger,
            verifier,
            ids: TxnIdGenerator::new(),
            payment_locks: KeyedLocks::new(),
            txn_locks: KeyedLocks::new(),
            max_credential_attempts: max_credential_attempts.max(1),
        }
    }

    /// Open a transaction for `payer_vpa` against a `CREATED` intent.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown payment or payer address.
    /// - `InvalidAddress` for a malformed payer address or one owned by the payee.
    /// - `Conflict` if the intent is terminal or pending for another payer.
    pub async fn initiate(&self, payment_id: &PaymentId, payer_vpa: &str) -> Result<UpiTransaction> {
        let payer_address = self.directory.parse_address(payer_vpa)?;
        let _guard = self.payment_locks.lock(payment_id).await;

        let intent = self.intents.get(payment_id)?;
        match intent.status {
            IntentStatus::Created => {}
            IntentStatus::Pending => {
                return match (intent.txn_id, &intent.payer_vpa) {
                    (Some(txn_id), Some(payer)) if *payer == payer_address => {
                        tracing::debug!(
                            payment_id = %payment_id,
                            txn_id = %txn_id,
                            "Initiate replayed for pending payment"
                        );
                        self.get_transaction(&txn_id)
                    }
                    _ => Err(PaymentError::Conflict(format!(
                        "payment {payment_id} is already being paid by another payer"
                    ))),
                };
            }
            IntentStatus::Completed | IntentStatus::Failed => {
                return Err(PaymentError::Conflict(format!(
                    "payment {payment_id} is already {}",
                    intent.status.as_str()
                )));
            }
        }

        let payer = self.directory.resolve_address(&payer_address)?;
        let payee = self.directory.resolve_address(&intent.payee_vpa)?;
        if payer.user_id == payee.user_id {
            return Err(PaymentError::InvalidAddress(
                "payer and payee must be different users".into(),
            ));
        }

        let txn_id = self.ids.next_id();
        let pending = intent.mark_pending(txn_id, payer_address.clone())?;
        let txn = UpiTransaction::initiate(txn_id, &pending, payer_address);
        self.store.open_transaction(&txn, &pending)?;

        tracing::info!(
            payment_id = %payment_id,
            txn_id = %txn_id,
            payer_vpa = %txn.payer_vpa,
            payee_vpa = %txn.payee_vpa,
            amount = txn.amount,
            "Transaction initiated"
        );
        Ok(txn)
    }

    /// Authorize and settle an initiated transaction.
    ///
    /// Insufficient funds is a normal outcome (`FAILED`), not an error.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown transaction or a missing wallet.
    /// - `Unauthorized` for a rejected credential (attempts remaining).
    /// - `CredentialLocked` when the rejected credential exhausted the attempts; the
    ///   transaction is `FAILED` from then on.
    pub async fn confirm(&self, txn_id: &TxnId, pin: &str) -> Result<ConfirmOutcome> {
        let _guard = self.txn_locks.lock(txn_id).await;

        let txn = self.get_transaction(txn_id)?;
        if txn.status.is_terminal() {
            tracing::debug!(
                txn_id = %txn_id,
                status = txn.status.as_str(),
                "Confirm replayed for finalized transaction"
            );
            return Ok(ConfirmOutcome::from(&txn));
        }

        let payer = self.directory.resolve_address(&txn.payer_vpa)?;
        let payee = self.directory.resolve_address(&txn.payee_vpa)?;

        if !self.verifier.verify(&payer.user_id, pin)? {
            return Err(self.reject_credential(&txn)?);
        }

        let intent = self.intents.get(&txn.payment_id)?;
        let mut settlement_ref: Option<SettlementRef> = None;

        let settled = self
            .ledger
            .settle(&payer.user_id, &payee.user_id, txn.amount, |_| {
                let reference = match &settlement_ref {
                    Some(reference) => reference.clone(),
                    None => {
                        let sequence = self.store.next_sequence(SETTLEMENT_SEQUENCE)?;
                        let reference = SettlementRef::allocate(sequence, Utc::now());
                        settlement_ref = Some(reference.clone());
                        reference
                    }
                };
                Ok(Settlement {
                    transaction: txn.succeeded(reference)?,
                    intent: intent.finalized(TxnStatus::Success)?,
                })
            })
            .await;

        match settled {
            Ok(_) => {
                let done = self.get_transaction(txn_id)?;
                tracing::info!(
                    txn_id = %txn_id,
                    payment_id = %done.payment_id,
                    settlement_ref = ?done.settlement_ref,
                    amount = done.amount,
                    "Payment settled"
                );
                Ok(ConfirmOutcome::from(&done))
            }
            Err(PaymentError::InsufficientFunds { balance, required }) => {
                let failed = txn.failed(FailureReason::InsufficientFunds)?;
                let failed_intent = intent.finalized(TxnStatus::Failed)?;
                self.store.finalize_transaction(&failed, &failed_intent)?;

                tracing::warn!(
                    txn_id = %txn_id,
                    payment_id = %failed.payment_id,
                    balance,
                    required,
                    "Payment failed: insufficient funds"
                );
                Ok(ConfirmOutcome::from(&failed))
            }
            Err(err) => Err(err),
        }
    }

    /// Look up a transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub fn get_transaction(&self, txn_id: &TxnId) -> Result<UpiTransaction> {
        self.store
            .get_transaction(txn_id)?
            .ok_or_else(|| PaymentError::not_found("transaction", txn_id))
    }

    /// Count a rejected credential, failing the transaction once attempts run out.
    /// Returns the error to report.
    fn reject_credential(&self, txn: &UpiTransaction) -> Result<PaymentError> {
        let attempted = txn.with_rejected_credential();

        if attempted.credential_attempts >= self.max_credential_attempts {
            let failed = attempted.failed(FailureReason::CredentialLocked)?;
            let intent = self
                .intents
                .get(&txn.payment_id)?
                .finalized(TxnStatus::Failed)?;
            self.store.finalize_transaction(&failed, &intent)?;

            tracing::warn!(
                txn_id = %txn.txn_id,
                attempts = attempted.credential_attempts,
                "Credential attempts exhausted, transaction failed"
            );
            return Ok(PaymentError::CredentialLocked {
                txn_id: txn.txn_id.to_string(),
            });
        }

        self.store.update_open_transaction(&attempted)?;
        let remaining = self.max_credential_attempts - attempted.credential_attempts;
        tracing::info!(
            txn_id = %txn.txn_id,
            attempts = attempted.credential_attempts,
            remaining,
            "Credential rejected"
        );
        Ok(PaymentError::Unauthorized(format!(
            "invalid PIN, {remaining} attempt(s) remaining"
        )))
    }
}
