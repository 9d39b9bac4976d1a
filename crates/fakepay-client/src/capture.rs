//! QR capture lifecycle.
//!
//! A [`CaptureSource`] produces decoded strings (from a camera, an image file, a test
//! fixture). [`Scanner::start`] drives it on a background task and resolves each string
//! to a payment id:
//!
//! ```text
//! CaptureSource --next_decoded--> scanner task --resolve--> mpsc --> ScanHandle
//!                                      ^                                 |
//!                                      +------- CancellationToken -------+
//! ```
//!
//! Strings that do not resolve are reported and scanning continues. The first
//! resolved id stops the scanner.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fakepay_core::{resolve_payment_id, PaymentId, ResolveError};

const RESULT_BUFFER: usize = 16;

/// Something that yields decoded QR payloads.
#[async_trait]
pub trait CaptureSource: Send + 'static {
    /// The next decoded payload, or `None` once the source is closed.
    async fn next_decoded(&mut self) -> Option<String>;
}

/// Starts capture sessions.
pub struct Scanner;

impl Scanner {
    /// Start reading `source` on a background task.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn start<S: CaptureSource>(mut source: S) -> ScanHandle {
        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                let decoded = tokio::select! {
                    () = token.cancelled() => break,
                    decoded = source.next_decoded() => decoded,
                };
                let Some(text) = decoded else {
                    tracing::debug!("Capture source closed");
                    break;
                };

                if tx.send(resolve_payment_id(&text)).await.is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Scanner started");
        ScanHandle {
            results: rx,
            cancel,
            task,
            last_error: None,
        }
    }
}

/// A running capture session. Dropping the handle stops the scanner.
pub struct ScanHandle {
    results: mpsc::Receiver<Result<PaymentId, ResolveError>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    last_error: Option<ResolveError>,
}

impl ScanHandle {
    /// The next resolution attempt, successful or not. `None` once the scanner has
    /// stopped and every pending result has been read.
    pub async fn next_event(&mut self) -> Option<Result<PaymentId, ResolveError>> {
        self.results.recv().await
    }

    /// Wait for the first payload that resolves to a payment, then stop scanning.
    ///
    /// Unrecognized payloads are logged and kept as [`last_error`](Self::last_error).
    /// Returns `None` if the scanner stops first.
    pub async fn next_payment(&mut self) -> Option<PaymentId> {
        while let Some(result) = self.next_event().await {
            match result {
                Ok(payment_id) => {
                    tracing::info!(payment_id = %payment_id, "Payment code scanned");
                    self.stop();
                    return Some(payment_id);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Scanned code is not a payment");
                    self.last_error = Some(err);
                }
            }
        }
        None
    }

    /// The most recent resolver failure seen by [`next_payment`](Self::next_payment).
    #[must_use]
    pub fn last_error(&self) -> Option<&ResolveError> {
        self.last_error.as_ref()
    }

    /// Stop the scanner. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
