//! UPI transaction handlers: initiate, confirm, lookup, history.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fakepay_core::{
    format_minor_units, FailureReason, HistoryFilter, PaymentError, PaymentId, TxnId,
    TxnStatus, UpiTransaction, UserId,
};

use crate::error::ApiError;
use crate::processor::ConfirmOutcome;
use crate::state::AppState;

/// Transaction view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Transaction ID.
    pub txn_id: String,
    /// The intent being paid.
    pub payment_id: String,
    /// Paying address.
    pub payer_vpa: String,
    /// Receiving address.
    pub payee_vpa: String,
    /// Amount in paise.
    pub amount: i64,
    /// Amount formatted as rupees.
    pub amount_formatted: String,
    /// `INITIATED`, `SUCCESS` or `FAILED`.
    pub status: &'static str,
    /// UTR, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<String>,
    /// Why the payment failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    /// Free-text note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Initiation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<&UpiTransaction> for TransactionResponse {
    fn from(txn: &UpiTransaction) -> Self {
        Self {
            txn_id: txn.txn_id.to_string(),
            payment_id: txn.payment_id.to_string(),
            payer_vpa: txn.payer_vpa.to_string(),
            payee_vpa: txn.payee_vpa.to_string(),
            amount: txn.amount,
            amount_formatted: format_minor_units(txn.amount),
            status: txn.status.as_str(),
            settlement_ref: txn.settlement_ref.as_ref().map(ToString::to_string),
            failure_reason: txn.failure_reason,
            note: txn.note.clone(),
            created_at: txn.created_at,
            updated_at: txn.updated_at,
        }
    }
}

/// Initiate request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    /// Intent to pay.
    pub payment_id: String,
    /// Paying address.
    pub payer_vpa: String,
}

/// Initiate response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    /// The open transaction.
    pub txn_id: String,
    /// Always `INITIATED`.
    pub status: &'static str,
    /// The intent being paid.
    pub payment_id: String,
    /// Amount in paise.
    pub amount: i64,
    /// Receiving address.
    pub payee_vpa: String,
}

/// Open a transaction against a payment intent.
pub async fn initiate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitiateRequest>,
) -> Result<Json<InitiateResponse>, ApiError> {
    let payment_id: PaymentId = req.payment_id.parse()?;
    let txn = state.processor.initiate(&payment_id, &req.payer_vpa).await?;

    Ok(Json(InitiateResponse {
        txn_id: txn.txn_id.to_string(),
        status: txn.status.as_str(),
        payment_id: txn.payment_id.to_string(),
        amount: txn.amount,
        payee_vpa: txn.payee_vpa.to_string(),
    }))
}

/// Confirm request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// Transaction to confirm.
    pub txn_id: String,
    /// Payer's PIN.
    pub pin: String,
}

/// Confirm response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    /// `SUCCESS` or `FAILED`.
    pub status: &'static str,
    /// The confirmed transaction.
    pub txn_id: String,
    /// The intent it paid.
    pub payment_id: String,
    /// UTR, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<String>,
    /// Why the payment failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl From<&ConfirmOutcome> for ConfirmResponse {
    fn from(outcome: &ConfirmOutcome) -> Self {
        Self {
            status: outcome.status.as_str(),
            txn_id: outcome.txn_id.to_string(),
            payment_id: outcome.payment_id.to_string(),
            settlement_ref: outcome.settlement_ref.as_ref().map(ToString::to_string),
            failure_reason: outcome.failure_reason,
        }
    }
}

/// Authorize and settle a transaction.
///
/// A `FAILED` outcome is an error carrying the outcome in `details`, so clients that
/// treat any 2xx as success stay correct: 401 `credential_locked` once PIN attempts
/// ran out, 402 `payment_failed` otherwise. Replays return the same response as the
/// call that finalized the transaction.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let txn_id: TxnId = req.txn_id.parse()?;
    let outcome = match state.processor.confirm(&txn_id, &req.pin).await {
        Ok(outcome) => outcome,
        Err(PaymentError::CredentialLocked { .. }) => {
            ConfirmOutcome::from(&state.processor.get_transaction(&txn_id)?)
        }
        Err(err) => return Err(err.into()),
    };
    let response = ConfirmResponse::from(&outcome);

    if outcome.status == TxnStatus::Failed {
        let details =
            serde_json::to_value(&response).map_err(|e| ApiError::Internal(e.to_string()))?;
        return Err(match outcome.failure_reason {
            Some(FailureReason::CredentialLocked) => ApiError::CredentialLocked {
                message: "Payment failed: too many incorrect PIN attempts".into(),
                details,
            },
            _ => ApiError::PaymentFailed {
                message: "Payment failed: insufficient balance".into(),
                details,
            },
        });
    }

    Ok(Json(response))
}

/// `{ "transaction": ... }`
#[derive(Debug, Serialize)]
pub struct TransactionEnvelope {
    /// The transaction.
    pub transaction: TransactionResponse,
}

/// Get a transaction.
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(txn_id): Path<String>,
) -> Result<Json<TransactionEnvelope>, ApiError> {
    let txn_id: TxnId = txn_id.parse()?;
    let txn = state.processor.get_transaction(&txn_id)?;

    Ok(Json(TransactionEnvelope {
        transaction: TransactionResponse::from(&txn),
    }))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Page size (default 20, at most 100).
    #[serde(default)]
    pub limit: Option<usize>,
    /// `all`, `sent` or `received` (default `all`).
    #[serde(default)]
    pub filter: HistoryFilter,
}

/// `{ "transactions": [...] }`
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// List a user's transactions across all of their addresses.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let transactions = state
        .history
        .query_user(&user_id, query.limit, query.filter)?;

    Ok(Json(HistoryResponse {
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
    }))
}
