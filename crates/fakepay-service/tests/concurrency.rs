//! Concurrency integration tests.

mod common;

use std::sync::Arc;

use common::TestHarness;
use futures::future::join_all;
use serde_json::Value;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_concurrent_confirms_settle_once() {
    let harness = Arc::new(TestHarness::new());
    harness.onboard("usr_alice", "alice@fakepay", 10_000).await;
    harness.onboard("usr_shop", "shop@fakepay", 0).await;
    harness.create_payment("abc123", 5_000, "shop@fakepay").await;
    let txn_id = harness.initiate_ok("abc123", "alice@fakepay").await;

    let confirms = (0..8).map(|_| {
        let harness = harness.clone();
        let txn_id = txn_id.clone();
        async move {
            let response = harness.confirm(&txn_id, "1234").await;
            response.assert_status_ok();
            response.json::<Value>()
        }
    });
    let bodies = join_all(confirms).await;

    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(harness.balance("usr_alice").await, 5_000);
    assert_eq!(harness.balance("usr_shop").await, 5_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_conserve_money() {
    let harness = Arc::new(TestHarness::new());
    harness.onboard("usr_alice", "alice@fakepay", 10_000).await;
    harness.onboard("usr_bob", "bob@fakepay", 10_000).await;

    for i in 0..10 {
        let payee = if i % 2 == 0 { "bob@fakepay" } else { "alice@fakepay" };
        harness.create_payment(&format!("p{i}"), 100, payee).await;
    }

    let payments = (0..10).map(|i| {
        let harness = harness.clone();
        async move {
            let payer = if i % 2 == 0 { "alice@fakepay" } else { "bob@fakepay" };
            let txn_id = harness.initiate_ok(&format!("p{i}"), payer).await;
            harness.confirm(&txn_id, "1234").await.assert_status_ok();
        }
    });
    join_all(payments).await;

    let alice = harness.balance("usr_alice").await;
    let bob = harness.balance("usr_bob").await;
    assert_eq!(alice + bob, 20_000);
    assert_eq!(alice, 10_000);
}
