//! Common test utilities for fakepay integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use fakepay_service::{create_router, AppState, ServiceConfig, StorageBackend};
use fakepay_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The service API key for payee-side requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and format-only PINs.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness after adjusting the default test configuration.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let service_api_key = "test-service-key".to_string();

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            storage_backend: StorageBackend::Rocks,
            service_api_key: Some(service_api_key.clone()),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            service_api_key,
        }
    }

    /// Register `vpa` for `user_id` and top the wallet up with `balance` paise.
    pub async fn onboard(&self, user_id: &str, vpa: &str, balance: i64) {
        self.server
            .post("/api/v1/upi/vpa")
            .json(&json!({ "userId": user_id, "vpa": vpa }))
            .await
            .assert_status_ok();

        if balance > 0 {
            self.server
                .post("/api/v1/wallets/topup")
                .json(&json!({ "userId": user_id, "amount": balance }))
                .await
                .assert_status_ok();
        }
    }

    /// Create a payment intent with a fixed id.
    pub async fn create_payment(&self, payment_id: &str, amount: i64, payee_vpa: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/payments")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&json!({
                "orderId": format!("order-{payment_id}"),
                "amount": amount,
                "payeeVpa": payee_vpa,
                "paymentId": payment_id,
            }))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Initiate and return the response.
    pub async fn initiate(&self, payment_id: &str, payer_vpa: &str) -> TestResponse {
        self.server
            .post("/api/v1/upi/initiate")
            .json(&json!({ "paymentId": payment_id, "payerVpa": payer_vpa }))
            .await
    }

    /// Initiate, asserting success, and return the transaction id.
    pub async fn initiate_ok(&self, payment_id: &str, payer_vpa: &str) -> String {
        let response = self.initiate(payment_id, payer_vpa).await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["txnId"].as_str().expect("txnId").to_string()
    }

    /// Confirm and return the response.
    pub async fn confirm(&self, txn_id: &str, pin: &str) -> TestResponse {
        self.server
            .post("/api/v1/upi/confirm")
            .json(&json!({ "txnId": txn_id, "pin": pin }))
            .await
    }

    /// A user's transactions, newest first.
    pub async fn history(&self, user_id: &str) -> Vec<Value> {
        let response = self
            .server
            .get(&format!("/api/v1/upi/history/{user_id}?limit=100"))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["transactions"].as_array().cloned().unwrap_or_default()
    }

    /// Current status of a payment intent.
    pub async fn payment_status(&self, payment_id: &str) -> String {
        let response = self.server.get(&format!("/api/v1/payments/{payment_id}")).await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["payment"]["status"].as_str().expect("status").to_string()
    }

    /// Current balance of a wallet.
    pub async fn balance(&self, user_id: &str) -> i64 {
        let response = self.server.get(&format!("/api/v1/wallets/{user_id}")).await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["wallet"]["balance"].as_i64().expect("balance")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
