//! VPA directory and PIN enrollment handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fakepay_core::{UserId, Vpa};

use crate::error::ApiError;
use crate::state::AppState;

/// VPA view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaResponse {
    /// The address, e.g. `alice@fakepay`.
    pub vpa: String,
    /// Registration ID.
    pub vpa_id: String,
    /// Owner.
    pub user_id: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<&Vpa> for VpaResponse {
    fn from(vpa: &Vpa) -> Self {
        Self {
            vpa: vpa.address.to_string(),
            vpa_id: vpa.vpa_id.to_string(),
            user_id: vpa.user_id.to_string(),
            created_at: vpa.created_at,
        }
    }
}

/// `{ "vpa": ... }`
#[derive(Debug, Serialize)]
pub struct VpaEnvelope {
    /// The registration.
    pub vpa: VpaResponse,
}

/// Registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVpaRequest {
    /// Owner.
    pub user_id: String,
    /// Requested address.
    pub vpa: String,
}

/// Register a VPA for a user.
pub async fn register_vpa(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterVpaRequest>,
) -> Result<Json<VpaEnvelope>, ApiError> {
    let user_id: UserId = req.user_id.parse()?;
    let vpa = state.directory.register(&user_id, &req.vpa)?;

    Ok(Json(VpaEnvelope {
        vpa: VpaResponse::from(&vpa),
    }))
}

/// Resolve an address to its registration.
pub async fn resolve_vpa(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<VpaEnvelope>, ApiError> {
    let vpa = state.directory.resolve(&address)?;

    Ok(Json(VpaEnvelope {
        vpa: VpaResponse::from(&vpa),
    }))
}

/// `{ "vpas": [...] }`
#[derive(Debug, Serialize)]
pub struct VpaListEnvelope {
    /// Registrations, oldest first.
    pub vpas: Vec<VpaResponse>,
}

/// Every address a user owns. Unknown users own none.
pub async fn list_vpas(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<VpaListEnvelope>, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let vpas = state.directory.list_by_user(&user_id)?;

    Ok(Json(VpaListEnvelope {
        vpas: vpas.iter().map(VpaResponse::from).collect(),
    }))
}

/// PIN enrollment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPinRequest {
    /// Payer.
    pub user_id: String,
    /// New 4 to 6 digit PIN.
    pub pin: String,
}

/// PIN enrollment response.
#[derive(Debug, Serialize)]
pub struct SetPinResponse {
    /// Always `true` on success.
    pub enrolled: bool,
}

/// Enroll or replace a user's PIN.
pub async fn set_pin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetPinRequest>,
) -> Result<Json<SetPinResponse>, ApiError> {
    let user_id: UserId = req.user_id.parse()?;
    // Only users with an address can pay, so only they may enroll.
    state.directory.by_user(&user_id)?;
    state.credentials.enroll(&user_id, &req.pin)?;

    Ok(Json(SetPinResponse { enrolled: true }))
}
