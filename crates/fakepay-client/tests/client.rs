//! Client integration tests against a mock server.

use fakepay_client::{
    AccountSetup, ClientError, ClientOptions, CreatePayment, FakePayClient, HistoryQuery,
    Session,
};
use fakepay_core::{FailureReason, HistoryFilter, TxnStatus};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    Session {
        user_id: "usr_alice".into(),
        name: "Alice".into(),
        phone: None,
        email: None,
        vpa: "alice@fakepay".into(),
        vpa_id: "vpa-1".into(),
        addresses: vec!["alice@fakepay".into()],
    }
}

fn wallet(user_id: &str, balance: i64) -> serde_json::Value {
    json!({
        "wallet": {
            "userId": user_id,
            "balance": balance,
            "balanceFormatted": "100.00",
            "version": 1,
            "updatedAt": "2026-03-14T08:35:00Z"
        }
    })
}

#[tokio::test]
async fn setup_account_registers_and_funds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/upi/vpa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vpa": {
                "vpa": "alicesmith@fakepay",
                "vpaId": "vpa-1",
                "userId": "usr_1_abc",
                "createdAt": "2026-03-14T08:35:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/wallets/topup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wallet("usr_1_abc", 10_000)))
        .expect(1)
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let mut setup = AccountSetup::new("Alice", "Alice Smith");
    setup.email = Some("alice@example.com".into());

    let session = client.setup_account(setup).await.unwrap();

    assert_eq!(session.vpa, "alicesmith@fakepay");
    assert_eq!(session.vpa_id, "vpa-1");
    assert_eq!(session.addresses, ["alicesmith@fakepay"]);
    assert_eq!(session.email.as_deref(), Some("alice@example.com"));
    assert!(session.user_id.starts_with("usr_"));

    let requests = server.received_requests().await.unwrap();
    let register: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(register["vpa"], "alicesmith@fakepay");
    assert_eq!(register["userId"], session.user_id.as_str());
    let topup: serde_json::Value = requests[1].body_json().unwrap();
    assert_eq!(topup["amount"], 10_000);
}

#[tokio::test]
async fn get_wallet_reads_balance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/wallets/usr_alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wallet("usr_alice", 4_200)))
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let wallet = client.get_wallet("usr_alice").await.unwrap();

    assert_eq!(wallet.balance, 4_200);
}

#[tokio::test]
async fn initiate_sends_session_vpa() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/upi/initiate"))
        .and(body_json(json!({ "paymentId": "abc123", "payerVpa": "alice@fakepay" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "txnId": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "status": "INITIATED",
            "paymentId": "abc123",
            "amount": 5000,
            "payeeVpa": "shop@fakepay"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let txn = client.initiate(&session(), "abc123").await.unwrap();

    assert_eq!(txn.txn_id, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
    assert_eq!(txn.status, TxnStatus::Initiated);
}

#[tokio::test]
async fn confirm_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/upi/confirm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "txnId": "t1",
            "paymentId": "abc123",
            "settlementRef": "FKP260314000001"
        })))
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let outcome = client.confirm("t1", "1234").await.unwrap();

    assert_eq!(outcome.status, TxnStatus::Success);
    assert_eq!(outcome.settlement_ref.as_deref(), Some("FKP260314000001"));
}

#[tokio::test]
async fn confirm_failure_carries_outcome() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/upi/confirm"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": "Payment failed: insufficient balance",
            "code": "payment_failed",
            "details": {
                "status": "FAILED",
                "txnId": "t1",
                "paymentId": "abc123",
                "failureReason": "INSUFFICIENT_FUNDS"
            }
        })))
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let err = client.confirm("t1", "1234").await.unwrap_err();

    match err {
        ClientError::PaymentFailed { message, outcome } => {
            assert_eq!(message, "Payment failed: insufficient balance");
            assert_eq!(outcome.status, TxnStatus::Failed);
            assert_eq!(outcome.failure_reason, Some(FailureReason::InsufficientFunds));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn wrong_pin_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/upi/confirm"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized: invalid PIN, 2 attempt(s) remaining",
            "code": "unauthorized"
        })))
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let err = client.confirm("t1", "0000").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized { .. }));
    assert!(err.display_message().contains("2 attempt(s)"));
}

#[tokio::test]
async fn history_passes_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/upi/history/usr_alice"))
        .and(query_param("limit", "100"))
        .and(query_param("filter", "sent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [{
                "txnId": "t1",
                "paymentId": "abc123",
                "payerVpa": "alice@fakepay",
                "payeeVpa": "shop@fakepay",
                "amount": 5000,
                "amountFormatted": "50.00",
                "status": "SUCCESS",
                "settlementRef": "FKP260314000001",
                "createdAt": "2026-03-14T08:35:00Z",
                "updatedAt": "2026-03-14T08:35:01Z"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let txns = client
        .history(
            &session(),
            HistoryQuery {
                limit: Some(100),
                filter: HistoryFilter::Sent,
            },
        )
        .await
        .unwrap();

    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].payee_vpa, "shop@fakepay");
}

#[tokio::test]
async fn not_found_and_unknown_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/payments/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "payment not found: nope",
            "code": "not_found"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/payments/broken"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();

    let err = client.get_payment("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound { .. }));

    let err = client.get_payment("broken").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 502, .. }));
}

#[tokio::test]
async fn create_payment_sends_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/payments"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment": {
                "paymentId": "abc123",
                "amount": 5000,
                "amountFormatted": "50.00",
                "orderId": "o-1",
                "status": "CREATED",
                "payeeVpa": "shop@fakepay",
                "createdAt": "2026-03-14T08:35:00Z",
                "updatedAt": "2026-03-14T08:35:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payment = CreatePayment {
        order_id: "o-1".into(),
        amount: 5_000,
        payee_vpa: "shop@fakepay".into(),
        payment_id: Some("abc123".into()),
    };

    let anonymous = FakePayClient::new(server.uri()).unwrap();
    assert!(matches!(
        anonymous.create_payment(&payment).await,
        Err(ClientError::Configuration(_))
    ));

    let client =
        FakePayClient::with_options(server.uri(), ClientOptions::with_api_key("secret")).unwrap();
    let created = client.create_payment(&payment).await.unwrap();
    assert_eq!(created.payment_id, "abc123");
}

#[tokio::test]
async fn refreshed_addresses_classify_history() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/upi/users/usr_alice/vpas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vpas": [
                {
                    "vpa": "alice@fakepay",
                    "vpaId": "vpa-1",
                    "userId": "usr_alice",
                    "createdAt": "2026-03-14T08:00:00Z"
                },
                {
                    "vpa": "alice2@fakepay",
                    "vpaId": "vpa-2",
                    "userId": "usr_alice",
                    "createdAt": "2026-03-14T08:05:00Z"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/upi/history/usr_alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [{
                "txnId": "01HZX0000000000000000000T1",
                "paymentId": "p1",
                "payerVpa": "alice2@fakepay",
                "payeeVpa": "bob@fakepay",
                "amount": 300,
                "status": "SUCCESS",
                "createdAt": "2026-03-14T08:35:00Z"
            }]
        })))
        .mount(&server)
        .await;

    let client = FakePayClient::new(server.uri()).unwrap();
    let mut session = session();
    client.refresh_addresses(&mut session).await.unwrap();
    assert_eq!(session.addresses, ["alice@fakepay", "alice2@fakepay"]);

    let txns = client.history(&session, HistoryQuery::default()).await.unwrap();
    let now = chrono::DateTime::parse_from_rfc3339("2026-03-14T12:00:00Z").unwrap();
    let groups = fakepay_client::group_by_day(&txns, &session, &now);
    let entry = &groups[0].entries[0];
    assert_eq!(entry.direction, fakepay_client::Direction::Sent);
    assert_eq!(entry.counterparty, "bob@fakepay");
    assert_eq!(entry.amount, "-₹3.00");
}
