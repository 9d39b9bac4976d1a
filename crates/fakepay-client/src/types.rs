//! Request and response types for the FakePay client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fakepay_core::{FailureReason, HistoryFilter, IntentStatus, TxnStatus};

// ============================================================================
// Responses
// ============================================================================

/// A wallet as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    /// Owner.
    pub user_id: String,
    /// Balance in paise.
    pub balance: i64,
    /// Optimistic-concurrency version.
    pub version: u64,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// A VPA registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaView {
    /// The address.
    pub vpa: String,
    /// Registration ID.
    pub vpa_id: String,
    /// Owner.
    pub user_id: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// A payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    /// Intent ID.
    pub payment_id: String,
    /// Amount in paise.
    pub amount: i64,
    /// Merchant order reference.
    pub order_id: String,
    /// Intent status.
    pub status: IntentStatus,
    /// Who gets paid.
    pub payee_vpa: String,
    /// Paying transaction, once initiated.
    #[serde(default)]
    pub txn_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Result of `initiate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateView {
    /// The open transaction.
    pub txn_id: String,
    /// Always `INITIATED`.
    pub status: TxnStatus,
}

/// Result of `confirm`, successful or failed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmView {
    /// `SUCCESS` or `FAILED`.
    pub status: TxnStatus,
    /// The confirmed transaction.
    pub txn_id: String,
    /// The intent it paid.
    pub payment_id: String,
    /// UTR, on success.
    #[serde(default)]
    pub settlement_ref: Option<String>,
    /// Why the payment failed.
    #[serde(default)]
    pub failure_reason: Option<FailureReason>,
}

/// A UPI transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
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
    /// Transaction status.
    pub status: TxnStatus,
    /// UTR, on success.
    #[serde(default)]
    pub settlement_ref: Option<String>,
    /// Why the payment failed.
    #[serde(default)]
    pub failure_reason: Option<FailureReason>,
    /// Initiation time.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WalletEnvelope {
    pub wallet: WalletView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VpaEnvelope {
    pub vpa: VpaView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VpaListEnvelope {
    #[serde(default)]
    pub vpas: Vec<VpaView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentEnvelope {
    pub payment: PaymentView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionEnvelope {
    pub transaction: TransactionView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryEnvelope {
    #[serde(default)]
    pub transactions: Vec<TransactionView>,
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopupRequest<'a> {
    pub user_id: &'a str,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterVpaRequest<'a> {
    pub user_id: &'a str,
    pub vpa: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetPinRequest<'a> {
    pub user_id: &'a str,
    pub pin: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitiateRequest<'a> {
    pub payment_id: &'a str,
    pub payer_vpa: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfirmRequest<'a> {
    pub txn_id: &'a str,
    pub pin: &'a str,
}

/// Payee-side intent creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayment {
    /// Merchant order reference.
    pub order_id: String,
    /// Amount in paise.
    pub amount: i64,
    /// Who gets paid.
    pub payee_vpa: String,
    /// Caller-chosen ID; generated by the service if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

/// History query.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HistoryQuery {
    /// Page size (service default 20, at most 100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Which side of the transactions to list.
    pub filter: HistoryFilter,
}
