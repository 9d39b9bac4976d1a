//! Behaviour shared by every `Store` backend, run against each from its own tests.

use chrono::{Duration, Utc};

use fakepay_core::{
    FailureReason, HistoryFilter, IntentStatus, PaymentIntent, PinCredential, SettlementRef,
    TxnIdGenerator, TxnStatus, UpiTransaction, UserId, Vpa, VpaAddress, DEFAULT_VPA_DOMAIN,
};

use crate::{Settlement, Store, StoreError, TransferCommit, WalletUpdate};

fn user(s: &str) -> UserId {
    s.parse().unwrap()
}

fn vpa(s: &str) -> VpaAddress {
    VpaAddress::parse(s, DEFAULT_VPA_DOMAIN).unwrap()
}

fn fund(store: &dyn Store, user_id: &UserId, amount: i64) {
    let wallet = store.open_wallet(user_id).unwrap();
    store
        .update_wallet(&WalletUpdate {
            wallet: wallet.credited(amount).unwrap(),
            expected_version: wallet.version,
        })
        .unwrap();
}

fn open_payment(
    store: &dyn Store,
    ids: &TxnIdGenerator,
    payment_id: &str,
    payer: &str,
    payee: &str,
    amount: i64,
) -> (UpiTransaction, PaymentIntent) {
    let intent = PaymentIntent::new(payment_id.parse().unwrap(), "order".into(), amount, vpa(payee))
        .unwrap();
    store.insert_intent(&intent).unwrap();

    let txn_id = ids.next_id();
    let pending = intent.mark_pending(txn_id, vpa(payer)).unwrap();
    let txn = UpiTransaction::initiate(txn_id, &pending, vpa(payer));
    store.open_transaction(&txn, &pending).unwrap();
    (txn, pending)
}

pub(crate) fn vpa_directory(store: &dyn Store) {
    let alice = user("alice");
    let first = Vpa::new(alice.clone(), vpa("alice@fakepay"));
    let mut second = Vpa::new(alice.clone(), vpa("ashop@fakepay"));
    second.created_at = first.created_at + Duration::seconds(1);

    store.insert_vpa(&first).unwrap();
    store.insert_vpa(&second).unwrap();

    let taken = store.insert_vpa(&Vpa::new(user("bob"), vpa("alice@fakepay")));
    assert!(matches!(taken, Err(StoreError::AlreadyExists { .. })));
    // A rejected registration writes nothing, wallet included.
    assert!(store.get_wallet(&user("bob")).unwrap().is_none());

    // Registration opens the owner's wallet in the same write.
    let wallet = store.get_wallet(&alice).unwrap().unwrap();
    assert_eq!((wallet.balance, wallet.version), (0, 0));

    let found = store.get_vpa(&vpa("alice@fakepay")).unwrap().unwrap();
    assert_eq!(found.user_id, alice);
    assert!(store.get_vpa(&vpa("nobody@fakepay")).unwrap().is_none());

    let owned: Vec<_> = store
        .list_vpas_by_user(&alice)
        .unwrap()
        .into_iter()
        .map(|v| v.address)
        .collect();
    assert_eq!(owned, vec![vpa("alice@fakepay"), vpa("ashop@fakepay")]);
    assert!(store.list_vpas_by_user(&user("bob")).unwrap().is_empty());
}

pub(crate) fn wallet_versions(store: &dyn Store) {
    let alice = user("alice");
    assert!(store.get_wallet(&alice).unwrap().is_none());

    let opened = store.open_wallet(&alice).unwrap();
    assert_eq!(opened.balance, 0);
    assert_eq!(store.open_wallet(&alice).unwrap(), opened);

    let topped = opened.credited(300).unwrap();
    store
        .update_wallet(&WalletUpdate {
            wallet: topped.clone(),
            expected_version: opened.version,
        })
        .unwrap();

    let stale = store.update_wallet(&WalletUpdate {
        wallet: opened.credited(999).unwrap(),
        expected_version: opened.version,
    });
    assert!(matches!(stale, Err(StoreError::VersionConflict { .. })));
    assert_eq!(store.get_wallet(&alice).unwrap().unwrap(), topped);

    let missing = store.update_wallet(&WalletUpdate {
        wallet: fakepay_core::Wallet::open(user("ghost")),
        expected_version: 0,
    });
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));
}

pub(crate) fn transfer_with_settlement(store: &dyn Store) {
    let ids = TxnIdGenerator::new();
    let (alice, shop) = (user("alice"), user("shop"));
    fund(store, &alice, 1000);
    store.open_wallet(&shop).unwrap();

    let (txn, intent) = open_payment(store, &ids, "pay_1", "alice@fakepay", "shop@fakepay", 400);

    let payer = store.get_wallet(&alice).unwrap().unwrap();
    let payee = store.get_wallet(&shop).unwrap().unwrap();
    let settled = txn
        .succeeded(SettlementRef::allocate(store.next_sequence("utr").unwrap(), Utc::now()))
        .unwrap();
    let completed = intent.finalized(TxnStatus::Success).unwrap();

    store
        .commit_transfer(&TransferCommit {
            debit: WalletUpdate {
                wallet: payer.debited(400).unwrap(),
                expected_version: payer.version,
            },
            credit: WalletUpdate {
                wallet: payee.credited(400).unwrap(),
                expected_version: payee.version,
            },
            settlement: Some(Settlement {
                transaction: settled.clone(),
                intent: completed,
            }),
        })
        .unwrap();

    assert_eq!(store.get_wallet(&alice).unwrap().unwrap().balance, 600);
    assert_eq!(store.get_wallet(&shop).unwrap().unwrap().balance, 400);
    assert_eq!(store.get_transaction(&txn.txn_id).unwrap().unwrap(), settled);
    assert_eq!(
        store.get_intent(&intent.payment_id).unwrap().unwrap().status,
        IntentStatus::Completed
    );
}

pub(crate) fn stale_transfer_is_rejected(store: &dyn Store) {
    let (alice, bob) = (user("alice"), user("bob"));
    fund(store, &alice, 1000);
    let bob_wallet = store.open_wallet(&bob).unwrap();
    let alice_wallet = store.get_wallet(&alice).unwrap().unwrap();

    let result = store.commit_transfer(&TransferCommit {
        debit: WalletUpdate {
            wallet: alice_wallet.debited(100).unwrap(),
            expected_version: alice_wallet.version - 1,
        },
        credit: WalletUpdate {
            wallet: bob_wallet.credited(100).unwrap(),
            expected_version: bob_wallet.version,
        },
        settlement: None,
    });
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    assert_eq!(store.get_wallet(&alice).unwrap().unwrap().balance, 1000);
    assert_eq!(store.get_wallet(&bob).unwrap().unwrap().balance, 0);

    let same = store.commit_transfer(&TransferCommit {
        debit: WalletUpdate {
            wallet: alice_wallet.debited(100).unwrap(),
            expected_version: alice_wallet.version,
        },
        credit: WalletUpdate {
            wallet: alice_wallet.credited(100).unwrap(),
            expected_version: alice_wallet.version,
        },
        settlement: None,
    });
    assert!(matches!(same, Err(StoreError::StateConflict(_))));
}

pub(crate) fn open_transaction_requires_created_intent(store: &dyn Store) {
    let ids = TxnIdGenerator::new();
    let (txn, pending) =
        open_payment(store, &ids, "pay_1", "alice@fakepay", "shop@fakepay", 100);
    assert_eq!(store.get_transaction(&txn.txn_id).unwrap().unwrap(), txn);
    assert_eq!(
        store.get_intent(&pending.payment_id).unwrap().unwrap().status,
        IntentStatus::Pending
    );

    let second = UpiTransaction::initiate(ids.next_id(), &pending, vpa("bob@fakepay"));
    let result = store.open_transaction(&second, &pending);
    assert!(matches!(result, Err(StoreError::StateConflict(_))));
    assert!(store.get_transaction(&second.txn_id).unwrap().is_none());
}

pub(crate) fn history_is_newest_first_and_filtered(store: &dyn Store) {
    let ids = TxnIdGenerator::new();
    let (t1, _) = open_payment(store, &ids, "pay_1", "alice@fakepay", "shop@fakepay", 100);
    let (t2, _) = open_payment(store, &ids, "pay_2", "bob@fakepay", "alice@fakepay", 200);
    let (t3, _) = open_payment(store, &ids, "pay_3", "alice@fakepay", "shop@fakepay", 300);

    let alice = vpa("alice@fakepay");
    let ids_of = |txns: Vec<UpiTransaction>| txns.into_iter().map(|t| t.txn_id).collect::<Vec<_>>();

    let all = store
        .list_transactions_by_vpa(&alice, HistoryFilter::All, 10)
        .unwrap();
    assert_eq!(ids_of(all), vec![t3.txn_id, t2.txn_id, t1.txn_id]);

    let sent = store
        .list_transactions_by_vpa(&alice, HistoryFilter::Sent, 10)
        .unwrap();
    assert_eq!(ids_of(sent), vec![t3.txn_id, t1.txn_id]);

    let received = store
        .list_transactions_by_vpa(&alice, HistoryFilter::Received, 10)
        .unwrap();
    assert_eq!(ids_of(received), vec![t2.txn_id]);

    let page = store
        .list_transactions_by_vpa(&alice, HistoryFilter::All, 2)
        .unwrap();
    assert_eq!(ids_of(page), vec![t3.txn_id, t2.txn_id]);

    assert!(store
        .list_transactions_by_vpa(&vpa("carol@fakepay"), HistoryFilter::All, 10)
        .unwrap()
        .is_empty());
}

pub(crate) fn finalize_is_single_shot(store: &dyn Store) {
    let ids = TxnIdGenerator::new();
    let (txn, pending) =
        open_payment(store, &ids, "pay_1", "alice@fakepay", "shop@fakepay", 100);

    let attempted = txn.with_rejected_credential();
    store.update_open_transaction(&attempted).unwrap();
    assert_eq!(
        store
            .get_transaction(&txn.txn_id)
            .unwrap()
            .unwrap()
            .credential_attempts,
        1
    );

    let failed = attempted.failed(FailureReason::InsufficientFunds).unwrap();
    let failed_intent = pending.finalized(TxnStatus::Failed).unwrap();
    store.finalize_transaction(&failed, &failed_intent).unwrap();

    let again = store.finalize_transaction(&failed, &failed_intent);
    assert!(matches!(again, Err(StoreError::StateConflict(_))));
    let counted = store.update_open_transaction(&attempted);
    assert!(matches!(counted, Err(StoreError::StateConflict(_))));

    let stored = store.get_transaction(&txn.txn_id).unwrap().unwrap();
    assert_eq!(stored.status, TxnStatus::Failed);
    assert_eq!(stored.failure_reason, Some(FailureReason::InsufficientFunds));
}

pub(crate) fn sequences_and_credentials(store: &dyn Store) {
    assert_eq!(store.next_sequence("utr").unwrap(), 1);
    assert_eq!(store.next_sequence("utr").unwrap(), 2);
    assert_eq!(store.next_sequence("other").unwrap(), 1);

    let alice = user("alice");
    assert!(store.get_credential(&alice).unwrap().is_none());
    let credential = PinCredential {
        user_id: alice.clone(),
        salt: "00ff".into(),
        digest: "abcd".into(),
        updated_at: Utc::now(),
    };
    store.put_credential(&credential).unwrap();
    assert_eq!(store.get_credential(&alice).unwrap().unwrap(), credential);
}
