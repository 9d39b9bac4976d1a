//! FakePay HTTP API Service.
//!
//! This crate provides the UPI payment core and its HTTP API:
//!
//! - VPA directory and wallet ledger
//! - Payment intents (payee side)
//! - Transaction processor (initiate/confirm with PIN checks)
//! - Transaction history
//!
//! # Authentication
//!
//! Payer-side routes are open. Creating a payment intent requires the service API key
//! in the `x-api-key` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when sync inside

pub mod auth;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod history;
pub mod intents;
pub mod ledger;
pub mod locks;
pub mod processor;
pub mod routes;
pub mod state;

pub use config::{ServiceConfig, StorageBackend};
pub use credentials::{CredentialVerifier, FormatOnly, HashedPin};
pub use directory::VpaDirectory;
pub use error::ApiError;
pub use history::HistoryIndex;
pub use intents::PaymentIntents;
pub use ledger::{TransferReceipt, WalletLedger};
pub use processor::{ConfirmOutcome, TransactionProcessor};
pub use routes::create_router;
pub use state::AppState;
