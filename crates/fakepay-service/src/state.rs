//! Application state.

use std::sync::Arc;

use fakepay_store::Store;

use crate::config::ServiceConfig;
use crate::credentials::{CredentialVerifier, FormatOnly, HashedPin};
use crate::directory::VpaDirectory;
use crate::history::HistoryIndex;
use crate::intents::PaymentIntents;
use crate::ledger::WalletLedger;
use crate::processor::TransactionProcessor;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// VPA registration and lookup.
    pub directory: VpaDirectory,

    /// Wallet balances.
    pub ledger: Arc<WalletLedger>,

    /// Payment intents.
    pub intents: PaymentIntents,

    /// Initiate/confirm state machine.
    pub processor: Arc<TransactionProcessor>,

    /// Transaction history.
    pub history: HistoryIndex,

    /// PIN checks and enrollment.
    pub credentials: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Wire the components over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let credentials: Arc<dyn CredentialVerifier> = match &config.pin_pepper {
            Some(pepper) => {
                tracing::info!(
                    require_enrolled = config.require_enrolled_pin,
                    "PIN enrollment enabled"
                );
                Arc::new(HashedPin::new(
                    store.clone(),
                    pepper.clone(),
                    config.require_enrolled_pin,
                ))
            }
            None => {
                tracing::warn!("PIN_PEPPER not configured - any well-formed PIN is accepted");
                Arc::new(FormatOnly)
            }
        };

        let directory = VpaDirectory::new(store.clone(), config.vpa_domain.clone());
        let ledger = Arc::new(WalletLedger::new(store.clone(), config.ledger_max_retries));
        let intents = PaymentIntents::new(store.clone(), directory.clone());
        let processor = Arc::new(TransactionProcessor::new(
            store.clone(),
            directory.clone(),
            intents.clone(),
            ledger.clone(),
            credentials.clone(),
            config.max_credential_attempts,
        ));
        let history = HistoryIndex::new(store.clone(), directory.clone());

        Self {
            store,
            config,
            directory,
            ledger,
            intents,
            processor,
            history,
            credentials,
        }
    }
}
