//! Payment intent handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fakepay_core::{format_minor_units, PaymentId, PaymentIntent};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Payment intent view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    /// Intent ID.
    pub payment_id: String,
    /// Amount in paise.
    pub amount: i64,
    /// Amount formatted as rupees.
    pub amount_formatted: String,
    /// Merchant order reference.
    pub order_id: String,
    /// `CREATED`, `PENDING`, `COMPLETED` or `FAILED`.
    pub status: &'static str,
    /// Who gets paid.
    pub payee_vpa: String,
    /// Paying transaction, once initiated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_id: Option<String>,
    /// Paying address, once initiated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_vpa: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentIntent> for PaymentResponse {
    fn from(intent: &PaymentIntent) -> Self {
        Self {
            payment_id: intent.payment_id.to_string(),
            amount: intent.amount,
            amount_formatted: format_minor_units(intent.amount),
            order_id: intent.order_id.clone(),
            status: intent.status.as_str(),
            payee_vpa: intent.payee_vpa.to_string(),
            txn_id: intent.txn_id.map(|id| id.to_string()),
            payer_vpa: intent.payer_vpa.as_ref().map(ToString::to_string),
            created_at: intent.created_at,
            updated_at: intent.updated_at,
        }
    }
}

/// `{ "payment": ... }`
#[derive(Debug, Serialize)]
pub struct PaymentEnvelope {
    /// The intent.
    pub payment: PaymentResponse,
}

/// Intent creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Merchant order reference.
    pub order_id: String,
    /// Amount in paise.
    pub amount: i64,
    /// Who gets paid.
    pub payee_vpa: String,
    /// Caller-chosen ID; generated if absent.
    #[serde(default)]
    pub payment_id: Option<String>,
}

/// Create a payment intent (service API key required).
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentEnvelope>, ApiError> {
    tracing::debug!(service = %auth.service_name, order_id = %req.order_id, "Create payment");

    let intent = state.intents.create(
        &req.order_id,
        req.amount,
        &req.payee_vpa,
        req.payment_id.as_deref(),
    )?;

    Ok(Json(PaymentEnvelope {
        payment: PaymentResponse::from(&intent),
    }))
}

/// Get a payment intent.
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentEnvelope>, ApiError> {
    let payment_id: PaymentId = payment_id.parse()?;
    let intent = state.intents.get(&payment_id)?;

    Ok(Json(PaymentEnvelope {
        payment: PaymentResponse::from(&intent),
    }))
}
