//! FakePay HTTP client implementation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, StatusCode};

use crate::error::ClientError;
use crate::session::Session;
use crate::types::{
    ApiErrorResponse, ConfirmRequest, ConfirmView, CreatePayment, HistoryEnvelope, HistoryQuery,
    InitiateRequest, InitiateView, PaymentEnvelope, PaymentView, RegisterVpaRequest,
    SetPinRequest, TopupRequest, TransactionEnvelope, TransactionView, VpaEnvelope,
    VpaListEnvelope, VpaView, WalletEnvelope, WalletView,
};

/// Balance given to a freshly set-up account, in paise.
pub const DEFAULT_INITIAL_BALANCE: i64 = 10_000;

/// FakePay API client.
///
/// Payer-side calls need no credentials. Creating payment intents needs the service
/// API key from [`ClientOptions::api_key`].
#[derive(Debug, Clone)]
pub struct FakePayClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FakePayClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://localhost:4000"`)
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: options.api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    // ========================================================================
    // Account setup
    // ========================================================================

    /// Create a user, register `<username>@fakepay` and fund the wallet.
    ///
    /// # Errors
    ///
    /// `Conflict` if the address is taken, `Api` for a username with no usable
    /// characters, or any transport error.
    pub async fn setup_account(&self, setup: AccountSetup) -> Result<Session, ClientError> {
        let user_id = generate_user_id();
        let vpa = format!("{}@fakepay", setup.vpa_handle());

        let registered = self.register_vpa(&user_id, &vpa).await?;
        if setup.initial_balance > 0 {
            self.topup(&user_id, setup.initial_balance).await?;
        }

        tracing::info!(user_id = %user_id, vpa = %registered.vpa, "Account set up");

        Ok(Session {
            user_id,
            name: setup.name,
            phone: setup.phone,
            email: setup.email,
            addresses: vec![registered.vpa.clone()],
            vpa: registered.vpa,
            vpa_id: registered.vpa_id,
        })
    }

    // ========================================================================
    // Wallets and directory
    // ========================================================================

    /// Get a user's wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_wallet(&self, user_id: &str) -> Result<WalletView, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/wallets/{user_id}")))
            .send()
            .await?;

        let envelope: WalletEnvelope = self.handle_response(response).await?;
        Ok(envelope.wallet)
    }

    /// Credit a user's wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn topup(&self, user_id: &str, amount: i64) -> Result<WalletView, ClientError> {
        let response = self
            .client
            .post(self.url("/wallets/topup"))
            .json(&TopupRequest { user_id, amount })
            .send()
            .await?;

        let envelope: WalletEnvelope = self.handle_response(response).await?;
        Ok(envelope.wallet)
    }

    /// Register an address for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn register_vpa(&self, user_id: &str, vpa: &str) -> Result<VpaView, ClientError> {
        let response = self
            .client
            .post(self.url("/upi/vpa"))
            .json(&RegisterVpaRequest { user_id, vpa })
            .send()
            .await?;

        let envelope: VpaEnvelope = self.handle_response(response).await?;
        Ok(envelope.vpa)
    }

    /// Register another address for the session's user and remember it.
    ///
    /// # Errors
    ///
    /// `Conflict` if the address is taken, or any transport error.
    pub async fn add_vpa(&self, session: &mut Session, vpa: &str) -> Result<VpaView, ClientError> {
        let registered = self.register_vpa(&session.user_id, vpa).await?;
        session.add_address(registered.vpa.clone());
        tracing::info!(user_id = %session.user_id, vpa = %registered.vpa, "Address added");
        Ok(registered)
    }

    /// Every address a user owns, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_vpas(&self, user_id: &str) -> Result<Vec<VpaView>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/upi/users/{user_id}/vpas")))
            .send()
            .await?;

        let envelope: VpaListEnvelope = self.handle_response(response).await?;
        Ok(envelope.vpas)
    }

    /// Reload the session's address set from the service, e.g. after the user
    /// registered an address on another device.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn refresh_addresses(&self, session: &mut Session) -> Result<(), ClientError> {
        let vpas = self.list_vpas(&session.user_id).await?;
        session.addresses = vpas.into_iter().map(|view| view.vpa).collect();
        if !session.addresses.contains(&session.vpa) {
            session.addresses.insert(0, session.vpa.clone());
        }
        Ok(())
    }

    /// Look up who owns an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn resolve_vpa(&self, vpa: &str) -> Result<VpaView, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/upi/vpa/{vpa}")))
            .send()
            .await?;

        let envelope: VpaEnvelope = self.handle_response(response).await?;
        Ok(envelope.vpa)
    }

    /// Enroll a PIN for the session's user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn set_pin(&self, session: &Session, pin: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("/upi/pin"))
            .json(&SetPinRequest {
                user_id: &session.user_id,
                pin,
            })
            .send()
            .await?;

        let _: serde_json::Value = self.handle_response(response).await?;
        Ok(())
    }

    // ========================================================================
    // Payments
    // ========================================================================

    /// Create a payment intent (payee side, needs the API key).
    ///
    /// # Errors
    ///
    /// `Configuration` without an API key; otherwise as the server reports.
    pub async fn create_payment(&self, payment: &CreatePayment) -> Result<PaymentView, ClientError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ClientError::Configuration("creating payments requires an API key".into())
        })?;

        let response = self
            .client
            .post(self.url("/payments"))
            .header("x-api-key", api_key)
            .json(payment)
            .send()
            .await?;

        let envelope: PaymentEnvelope = self.handle_response(response).await?;
        Ok(envelope.payment)
    }

    /// Get a payment intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentView, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/payments/{payment_id}")))
            .send()
            .await?;

        let envelope: PaymentEnvelope = self.handle_response(response).await?;
        Ok(envelope.payment)
    }

    /// Start paying `payment_id` from the session's address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn initiate(
        &self,
        session: &Session,
        payment_id: &str,
    ) -> Result<InitiateView, ClientError> {
        let response = self
            .client
            .post(self.url("/upi/initiate"))
            .json(&InitiateRequest {
                payment_id,
                payer_vpa: &session.vpa,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Authorize an initiated transaction.
    ///
    /// # Errors
    ///
    /// `PaymentFailed` carries the stored outcome when the payment ended `FAILED`.
    /// `Unauthorized` for a wrong PIN, `CredentialLocked` once attempts run out.
    pub async fn confirm(&self, txn_id: &str, pin: &str) -> Result<ConfirmView, ClientError> {
        let response = self
            .client
            .post(self.url("/upi/confirm"))
            .json(&ConfirmRequest { txn_id, pin })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_transaction(&self, txn_id: &str) -> Result<TransactionView, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/upi/transactions/{txn_id}")))
            .send()
            .await?;

        let envelope: TransactionEnvelope = self.handle_response(response).await?;
        Ok(envelope.transaction)
    }

    /// The session user's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn history(
        &self,
        session: &Session,
        query: HistoryQuery,
    ) -> Result<Vec<TransactionView>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/upi/history/{}", session.user_id)))
            .query(&query)
            .send()
            .await?;

        let envelope: HistoryEnvelope = self.handle_response(response).await?;
        Ok(envelope.transactions)
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => Err(map_api_error(status, api_error)),
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Map specific error codes to typed errors.
fn map_api_error(status: StatusCode, api_error: ApiErrorResponse) -> ClientError {
    let ApiErrorResponse {
        error: message,
        code,
        details,
    } = api_error;

    let detail_i64 = |key: &str| {
        details
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
    };

    let kind = code.clone();
    match kind.as_str() {
        "not_found" => ClientError::NotFound { message },
        "conflict" => ClientError::Conflict { message },
        "insufficient_funds" => ClientError::InsufficientFunds {
            balance: detail_i64("balance"),
            required: detail_i64("required"),
        },
        "payment_failed" => {
            match details.clone().map(serde_json::from_value::<ConfirmView>) {
                Some(Ok(outcome)) => ClientError::PaymentFailed {
                    message,
                    outcome: Box::new(outcome),
                },
                _ => ClientError::Api {
                    code,
                    message,
                    status: status.as_u16(),
                },
            }
        }
        "unauthorized" => ClientError::Unauthorized { message },
        "credential_locked" => ClientError::CredentialLocked { message },
        _ => ClientError::Api {
            code,
            message,
            status: status.as_u16(),
        },
    }
}

/// `usr_<unix millis>_<9 random lowercase alphanumerics>`.
fn generate_user_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("usr_{millis}_{suffix}")
}

/// Inputs to [`FakePayClient::setup_account`].
#[derive(Debug, Clone)]
pub struct AccountSetup {
    /// Display name.
    pub name: String,
    /// Desired address handle; reduced to lowercase alphanumerics.
    pub username: String,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Optional contact email.
    pub email: Option<String>,
    /// Opening balance in paise (default ₹100.00).
    pub initial_balance: i64,
}

impl AccountSetup {
    /// Setup with the default opening balance and no contact details.
    #[must_use]
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            phone: None,
            email: None,
            initial_balance: DEFAULT_INITIAL_BALANCE,
        }
    }

    fn vpa_handle(&self) -> String {
        self.username
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service API key for payee-side calls.
    pub api_key: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            api_key: None,
        }
    }
}

impl ClientOptions {
    /// Create options with a service API key.
    #[must_use]
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }
}
