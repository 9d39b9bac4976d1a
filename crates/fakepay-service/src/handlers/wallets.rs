//! Wallet handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fakepay_core::{format_minor_units, UserId, Wallet};

use crate::error::ApiError;
use crate::state::AppState;

/// Wallet view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    /// Owner.
    pub user_id: String,
    /// Balance in paise.
    pub balance: i64,
    /// Balance formatted as rupees.
    pub balance_formatted: String,
    /// Optimistic-concurrency version.
    pub version: u64,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl From<&Wallet> for WalletResponse {
    fn from(wallet: &Wallet) -> Self {
        Self {
            user_id: wallet.user_id.to_string(),
            balance: wallet.balance,
            balance_formatted: format_minor_units(wallet.balance),
            version: wallet.version,
            updated_at: wallet.updated_at,
        }
    }
}

/// `{ "wallet": ... }`
#[derive(Debug, Serialize)]
pub struct WalletEnvelope {
    /// The wallet.
    pub wallet: WalletResponse,
}

/// Get a user's wallet.
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<WalletEnvelope>, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let wallet = state.ledger.get_wallet(&user_id)?;

    Ok(Json(WalletEnvelope {
        wallet: WalletResponse::from(&wallet),
    }))
}

/// Top-up request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupRequest {
    /// Wallet owner.
    pub user_id: String,
    /// Amount in paise.
    pub amount: i64,
}

/// Credit a wallet, opening it if needed.
pub async fn topup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TopupRequest>,
) -> Result<Json<WalletEnvelope>, ApiError> {
    let user_id: UserId = req.user_id.parse()?;
    let wallet = state.ledger.topup(&user_id, req.amount).await?;

    Ok(Json(WalletEnvelope {
        wallet: WalletResponse::from(&wallet),
    }))
}
