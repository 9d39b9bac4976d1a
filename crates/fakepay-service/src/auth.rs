//! Service authentication.
//!
//! `ServiceAuth` guards payee-side operations (creating payment intents) with the
//! `x-api-key` header. Payer-side routes are open, as the demo client calls them
//! directly.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

/// A caller that presented the configured service API key.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The caller's self-reported name (`x-service-name`), for logs.
    pub service_name: String,
}

impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let api_key = parts
                .headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(ApiError::missing_api_key)?;

            // No configured key means payee operations are disabled.
            let expected_key = state
                .config
                .service_api_key
                .as_ref()
                .ok_or_else(ApiError::missing_api_key)?;

            if !constant_time_eq(api_key, expected_key) {
                return Err(ApiError::missing_api_key());
            }

            let service_name = parts
                .headers
                .get("x-service-name")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            Ok(ServiceAuth { service_name })
        })
    }
}
