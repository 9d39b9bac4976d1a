//! Payment intent integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn create_and_get_payment() {
    let harness = TestHarness::new();
    harness.onboard("usr_shop", "shop@fakepay", 0).await;

    let created = harness.create_payment("abc123", 5_000, "shop@fakepay").await;
    assert_eq!(created["payment"]["paymentId"], "abc123");
    assert_eq!(created["payment"]["status"], "CREATED");

    let response = harness.server.get("/api/v1/payments/abc123").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["payment"]["amount"], 5_000);
    assert_eq!(body["payment"]["amountFormatted"], "50.00");
    assert_eq!(body["payment"]["orderId"], "order-abc123");
    assert_eq!(body["payment"]["payeeVpa"], "shop@fakepay");
    assert!(body["payment"].get("txnId").is_none());
}

#[tokio::test]
async fn generated_payment_ids() {
    let harness = TestHarness::new();
    harness.onboard("usr_shop", "shop@fakepay", 0).await;

    let response = harness
        .server
        .post("/api/v1/payments")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({ "orderId": "o-1", "amount": 100, "payeeVpa": "shop@fakepay" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["payment"]["paymentId"]
        .as_str()
        .unwrap()
        .starts_with("pay_"));
}

#[tokio::test]
async fn create_payment_requires_api_key() {
    let harness = TestHarness::new();
    harness.onboard("usr_shop", "shop@fakepay", 0).await;

    let body = json!({ "orderId": "o-1", "amount": 100, "payeeVpa": "shop@fakepay" });

    harness
        .server
        .post("/api/v1/payments")
        .json(&body)
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post("/api/v1/payments")
        .add_header("x-api-key", "wrong-key")
        .json(&body)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn create_payment_validates_input() {
    let harness = TestHarness::new();
    harness.onboard("usr_shop", "shop@fakepay", 0).await;

    let cases = [
        (json!({ "orderId": "o", "amount": 0, "payeeVpa": "shop@fakepay" }), 400),
        (json!({ "orderId": "o", "amount": 100, "payeeVpa": "ghost@fakepay" }), 404),
        (json!({ "orderId": "o", "amount": 100, "payeeVpa": "shop@fakepay", "paymentId": "has space" }), 400),
    ];

    for (body, status) in cases {
        let response = harness
            .server
            .post("/api/v1/payments")
            .add_header("x-api-key", harness.service_api_key.clone())
            .json(&body)
            .await;
        assert_eq!(response.status_code().as_u16(), status, "{body}");
    }
}

#[tokio::test]
async fn duplicate_payment_id_conflicts() {
    let harness = TestHarness::new();
    harness.onboard("usr_shop", "shop@fakepay", 0).await;
    harness.create_payment("abc123", 100, "shop@fakepay").await;

    let response = harness
        .server
        .post("/api/v1/payments")
        .add_header("x-api-key", harness.service_api_key.clone())
        .json(&json!({ "orderId": "o", "amount": 100, "payeeVpa": "shop@fakepay", "paymentId": "abc123" }))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_payment_is_not_found() {
    let harness = TestHarness::new();

    let response = harness.server.get("/api/v1/payments/nope").await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "not_found");
    assert!(body["error"].as_str().unwrap().contains("nope"));
}
