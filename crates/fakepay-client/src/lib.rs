//! FakePay Client SDK.
//!
//! This crate provides a client library for the FakePay UPI API, plus the payer-side
//! pieces of the demo app: account setup, QR capture, and history grouping.
//!
//! # Example
//!
//! ```no_run
//! use fakepay_client::{AccountSetup, FakePayClient};
//!
//! # async fn example() -> Result<(), fakepay_client::ClientError> {
//! let client = FakePayClient::new("http://localhost:4000")?;
//!
//! let session = client
//!     .setup_account(AccountSetup::new("Alice", "alice"))
//!     .await?;
//!
//! let txn = client.initiate(&session, "abc123").await?;
//! let outcome = client.confirm(&txn.txn_id, "1234").await?;
//! println!("Paid, UTR {:?}", outcome.settlement_ref);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod capture;
mod client;
mod error;
mod history;
mod session;
mod types;

pub use capture::{CaptureSource, ScanHandle, Scanner};
pub use client::{AccountSetup, ClientOptions, FakePayClient};
pub use error::ClientError;
pub use history::{group_by_day, DayGroup, Direction, HistoryEntry};
pub use session::Session;
pub use types::*;
