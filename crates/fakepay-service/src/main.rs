//! FakePay Service - HTTP API for the UPI payment core
//!
//! This is the main entry point for the fakepay service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fakepay_service::{create_router, AppState, ServiceConfig, StorageBackend};
use fakepay_store::{MemoryStore, RocksStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fakepay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FakePay Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        storage_backend = ?config.storage_backend,
        vpa_domain = %config.vpa_domain,
        pin_enrollment = config.pin_pepper.is_some(),
        service_key_configured = config.service_api_key.is_some(),
        "Service configuration loaded"
    );

    let store: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Rocks => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB store");
            Arc::new(RocksStore::open(&config.data_dir)?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store - data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
