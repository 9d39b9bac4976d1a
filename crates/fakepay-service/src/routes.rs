//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, payments, upi, vpa, wallets};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Wallets
/// - `GET /api/v1/wallets/:user_id` - Get wallet
/// - `POST /api/v1/wallets/topup` - Credit a wallet
///
/// ## Directory
/// - `POST /api/v1/upi/vpa` - Register a VPA
/// - `GET /api/v1/upi/vpa/:address` - Resolve a VPA
/// - `GET /api/v1/upi/users/:user_id/vpas` - List a user's VPAs
/// - `POST /api/v1/upi/pin` - Enroll a PIN
///
/// ## Payments
/// - `POST /api/v1/payments` - Create a payment intent (service API key)
/// - `GET /api/v1/payments/:payment_id` - Get a payment intent
///
/// ## Transactions
/// - `POST /api/v1/upi/initiate` - Open a transaction
/// - `POST /api/v1/upi/confirm` - Authorize and settle
/// - `GET /api/v1/upi/transactions/:txn_id` - Get a transaction
/// - `GET /api/v1/upi/history/:user_id` - List a user's transactions
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api = Router::new()
        // Wallets
        .route("/wallets/topup", post(wallets::topup))
        .route("/wallets/:user_id", get(wallets::get_wallet))
        // Directory
        .route("/upi/vpa", post(vpa::register_vpa))
        .route("/upi/vpa/:address", get(vpa::resolve_vpa))
        .route("/upi/users/:user_id/vpas", get(vpa::list_vpas))
        .route("/upi/pin", post(vpa::set_pin))
        // Payments
        .route("/payments", post(payments::create_payment))
        .route("/payments/:payment_id", get(payments::get_payment))
        // Transactions
        .route("/upi/initiate", post(upi::initiate))
        .route("/upi/confirm", post(upi::confirm))
        .route("/upi/transactions/:txn_id", get(upi::get_transaction))
        .route("/upi/history/:user_id", get(upi::history));

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
