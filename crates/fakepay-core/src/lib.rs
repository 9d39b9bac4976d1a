//! Core types and utilities for FakePay.
//!
//! This crate provides the foundational types of the UPI payment core:
//!
//! - **Identifiers**: `UserId`, `PaymentId`, `VpaId`, `TxnId`
//! - **Directory**: `Vpa`, `VpaAddress`
//! - **Ledger**: `Wallet`
//! - **Payments**: `PaymentIntent`, `IntentStatus`, `UpiTransaction`, `TxnStatus`
//! - **Links**: `resolve_payment_id` for QR payloads and typed links
//!
//! # Amounts
//!
//! All amounts are `i64` minor currency units (paise): `10000` is ₹100.00. Floating
//! point never touches a balance.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credential;
pub mod error;
pub mod history;
pub mod ids;
pub mod money;
pub mod payment;
pub mod resolver;
pub mod settlement;
pub mod transaction;
pub mod vpa;
pub mod wallet;

pub use credential::{is_well_formed_pin, PinCredential};
pub use error::{ErrorKind, PaymentError, Result};
pub use history::{clamp_limit, HistoryFilter, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
pub use ids::{IdError, PaymentId, TxnId, TxnIdGenerator, UserId, VpaId};
pub use money::format_minor_units;
pub use payment::{IntentStatus, PaymentIntent};
pub use resolver::{resolve_payment_id, ResolveError};
pub use settlement::SettlementRef;
pub use transaction::{FailureReason, TxnStatus, UpiTransaction};
pub use vpa::{AddressError, Vpa, VpaAddress, DEFAULT_VPA_DOMAIN};
pub use wallet::Wallet;
