//! Wallet and VPA directory integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

// ============================================================================
// Wallets
// ============================================================================

#[tokio::test]
async fn registration_opens_empty_wallet() {
    let harness = TestHarness::new();
    harness.onboard("usr_alice", "alice@fakepay", 0).await;

    let response = harness.server.get("/api/v1/wallets/usr_alice").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["wallet"]["userId"], "usr_alice");
    assert_eq!(body["wallet"]["balance"], 0);
}

#[tokio::test]
async fn topup_credits_wallet() {
    let harness = TestHarness::new();
    harness.onboard("usr_alice", "alice@fakepay", 10_000).await;

    let response = harness
        .server
        .post("/api/v1/wallets/topup")
        .json(&json!({ "userId": "usr_alice", "amount": 2_550 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["wallet"]["balance"], 12_550);
    assert_eq!(body["wallet"]["balanceFormatted"], "125.50");
}

#[tokio::test]
async fn topup_rejects_non_positive_amounts() {
    let harness = TestHarness::new();
    harness.onboard("usr_alice", "alice@fakepay", 0).await;

    for amount in [0, -100] {
        let response = harness
            .server
            .post("/api/v1/wallets/topup")
            .json(&json!({ "userId": "usr_alice", "amount": amount }))
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "invalid_amount");
    }
}

#[tokio::test]
async fn unknown_wallet_is_not_found() {
    let harness = TestHarness::new();

    let response = harness.server.get("/api/v1/wallets/usr_ghost").await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "not_found");
}

// ============================================================================
// VPA directory
// ============================================================================

#[tokio::test]
async fn register_and_resolve_vpa() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/v1/upi/vpa")
        .json(&json!({ "userId": "usr_alice", "vpa": "alice@fakepay" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["vpa"]["vpa"], "alice@fakepay");
    assert_eq!(body["vpa"]["userId"], "usr_alice");
    let vpa_id = body["vpa"]["vpaId"].as_str().unwrap().to_string();

    let response = harness.server.get("/api/v1/upi/vpa/alice@fakepay").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["vpa"]["vpaId"], vpa_id);
}

#[tokio::test]
async fn lists_every_address_of_a_user() {
    let harness = TestHarness::new();
    harness.onboard("usr_alice", "alice@fakepay", 0).await;
    harness.onboard("usr_alice", "alicebiz@fakepay", 0).await;
    harness.onboard("usr_bob", "bob@fakepay", 0).await;

    let response = harness.server.get("/api/v1/upi/users/usr_alice/vpas").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let vpas: Vec<&str> = body["vpas"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["vpa"].as_str().unwrap())
        .collect();
    assert_eq!(vpas, ["alice@fakepay", "alicebiz@fakepay"]);

    let response = harness.server.get("/api/v1/upi/users/usr_ghost/vpas").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["vpas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_vpa_conflicts() {
    let harness = TestHarness::new();
    harness.onboard("usr_alice", "alice@fakepay", 0).await;

    let response = harness
        .server
        .post("/api/v1/upi/vpa")
        .json(&json!({ "userId": "usr_bob", "vpa": "alice@fakepay" }))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_vpa_rejected() {
    let harness = TestHarness::new();

    for vpa in ["alice", "alice@otherbank", "Alice@fakepay"] {
        let response = harness
            .server
            .post("/api/v1/upi/vpa")
            .json(&json!({ "userId": "usr_alice", "vpa": vpa }))
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "invalid_address");
    }
}

#[tokio::test]
async fn unknown_vpa_is_not_found() {
    let harness = TestHarness::new();

    let response = harness.server.get("/api/v1/upi/vpa/ghost@fakepay").await;

    response.assert_status_not_found();
}

// ============================================================================
// PIN enrollment
// ============================================================================

#[tokio::test]
async fn pin_enrollment_disabled_without_pepper() {
    let harness = TestHarness::new();
    harness.onboard("usr_alice", "alice@fakepay", 0).await;

    let response = harness
        .server
        .post("/api/v1/upi/pin")
        .json(&json!({ "userId": "usr_alice", "pin": "4321" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn pin_enrollment_requires_registered_user() {
    let harness = TestHarness::with_config(|c| c.pin_pepper = Some("pepper".into()));

    let response = harness
        .server
        .post("/api/v1/upi/pin")
        .json(&json!({ "userId": "usr_ghost", "pin": "4321" }))
        .await;

    response.assert_status_not_found();
}
