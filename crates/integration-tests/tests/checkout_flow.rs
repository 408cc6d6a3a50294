//! End-to-end checkout runs against the scripted backend.
//!
//! Each test scripts exactly the snapshots and order outcomes the
//! attempt should consume; the backend panics if the orchestrator asks
//! for more than the script allows.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use huerta_core::{Money, OrderId, UserId};
use huerta_integration_tests::{
    RecordingNotifier, ScriptedPrompt, TestBackend, TestHome, customer, customer_missing_comuna,
    product,
};
use huerta_storefront::api::ApiError;
use huerta_storefront::checkout::{CheckoutError, CheckoutOrchestrator, CheckoutPhase};
use huerta_storefront::models::Product;
use huerta_storefront::notify::{Notification, NotificationKind};

fn tomato(stock: u32) -> Product {
    product(1, "Tomate orgánico", "1990", stock)
}

fn avocado(stock: u32) -> Product {
    product(2, "Palta Hass", "4990", stock)
}

#[tokio::test]
async fn test_checkout_blocks_without_user() {
    let home = TestHome::new();
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::AuthRequired));
    assert_eq!(err.phase(), CheckoutPhase::IdentityCheck);
    assert_eq!(backend.snapshot_fetches(), 0);
    assert!(backend.submitted().is_empty());
    assert_eq!(notifier.kinds(), vec![NotificationKind::CheckoutBlockedAuth]);
    assert_eq!(session.cart().item_count(), 1);
}

#[tokio::test]
async fn test_checkout_blocks_on_incomplete_address() {
    let home = TestHome::new();
    home.sign_in(&customer_missing_comuna(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    match err {
        CheckoutError::IncompleteAddress { missing } => assert_eq!(missing, vec!["comuna"]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.snapshot_fetches(), 0);
    assert_eq!(
        notifier.kinds(),
        vec![NotificationKind::CheckoutBlockedAddress]
    );
}

#[tokio::test]
async fn test_checkout_blocks_on_empty_cart() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();

    let backend = TestBackend::new();
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(backend.snapshot_fetches(), 0);
    assert!(notifier.kinds().is_empty());
}

#[tokio::test]
async fn test_clean_checkout_submits_and_clears() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));
    session.cart_mut().add_or_increment(&tomato(5));
    session.cart_mut().add_or_increment(&avocado(3));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(5), avocado(3)]);
    backend.push_snapshot(&[tomato(5), avocado(3)]);
    backend.push_order_ok(42);
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let receipt = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap();

    assert_eq!(receipt.order_id, OrderId::new(42));
    assert_eq!(receipt.line_count, 2);
    assert_eq!(receipt.total, Money::parse("8970").unwrap());

    // Cart cleared in memory and on disk
    assert!(session.cart().is_empty());
    drop(session);
    assert!(home.open_session().cart().is_empty());

    assert_eq!(backend.snapshot_fetches(), 2);
    assert_eq!(prompt.calls(), 0);
    assert_eq!(notifier.kinds(), vec![NotificationKind::CheckoutSuccess]);
    let messages: Vec<String> = notifier
        .notifications()
        .iter()
        .map(Notification::message)
        .collect();
    assert!(messages[0].contains("42"));

    let submitted = backend.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].user_id, UserId::new(3));
    assert_eq!(submitted[0].total, Money::parse("8970").unwrap());
    assert_eq!(submitted[0].shipping_address.comuna, "Ñuñoa");
    assert_eq!(submitted[0].lines.len(), 2);
    assert_eq!(submitted[0].lines[0].quantity, 2);
}

#[tokio::test]
async fn test_pre_submit_conflict_reruns_remediation() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(5)]); // pre-reconcile: clean
    backend.push_snapshot(&[tomato(1)]); // revalidation: conflict
    backend.push_snapshot(&[tomato(1)]); // retry pre-reconcile: clean at qty 1
    backend.push_snapshot(&[tomato(1)]); // retry revalidation: clean
    backend.push_order_ok(7);
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let receipt = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap();

    assert_eq!(receipt.order_id, OrderId::new(7));
    assert_eq!(receipt.line_count, 1);
    assert_eq!(receipt.total, Money::parse("1990").unwrap());
    assert_eq!(prompt.calls(), 1);
    assert_eq!(backend.snapshot_fetches(), 4);
    assert_eq!(
        notifier.kinds(),
        vec![
            NotificationKind::StockConflict,
            NotificationKind::CheckoutSuccess
        ]
    );

    let submitted = backend.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].lines[0].quantity, 1);
}

#[tokio::test]
async fn test_pre_submit_conflict_defer_halts_without_submission() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(5)]);
    backend.push_snapshot(&[tomato(1)]);
    let prompt = ScriptedPrompt::always_defer();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::StockConflict));
    assert_eq!(err.phase(), CheckoutPhase::StockConflict);
    assert!(backend.submitted().is_empty());
    assert_eq!(backend.snapshot_fetches(), 2);
    assert_eq!(prompt.calls(), 1);
    assert_eq!(notifier.kinds(), vec![NotificationKind::StockConflict]);

    // Deferring leaves the cart exactly as it was
    assert_eq!(session.cart().lines()[0].quantity, 2);
    drop(session);
    assert_eq!(home.open_session().cart().lines()[0].quantity, 2);
}

#[tokio::test]
async fn test_second_conflict_halts_after_single_retry() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(3));
    session.cart_mut().add_or_increment(&tomato(3));
    session.cart_mut().add_or_increment(&tomato(3));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(3)]); // clean
    backend.push_snapshot(&[tomato(2)]); // first conflict, fix to 2
    backend.push_snapshot(&[tomato(2)]); // retry: clean
    backend.push_snapshot(&[tomato(1)]); // second conflict, retry budget spent
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::StockConflict));
    assert_eq!(prompt.calls(), 2);
    assert_eq!(backend.snapshot_fetches(), 4);
    assert!(backend.submitted().is_empty());
    assert_eq!(
        notifier.kinds(),
        vec![
            NotificationKind::StockConflict,
            NotificationKind::StockConflict
        ]
    );

    // The consented fixes were applied even though the attempt halted
    assert_eq!(session.cart().lines()[0].quantity, 1);
}

#[tokio::test]
async fn test_server_stock_rejection_loops_through_reconcile() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(5)]); // clean
    backend.push_snapshot(&[tomato(5)]); // clean, submit happens
    backend.push_snapshot(&[tomato(1)]); // after rejection: conflict, fix to 1
    backend.push_snapshot(&[tomato(1)]); // revalidation: clean
    backend.push_order_rejection("Stock insuficiente para Tomate orgánico");
    backend.push_order_ok(43);
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let receipt = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap();

    assert_eq!(receipt.order_id, OrderId::new(43));
    assert_eq!(prompt.calls(), 1);
    assert_eq!(backend.snapshot_fetches(), 4);
    assert_eq!(
        notifier.kinds(),
        vec![
            NotificationKind::StockConflict,
            NotificationKind::CheckoutSuccess
        ]
    );

    let submitted = backend.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].lines[0].quantity, 2);
    assert_eq!(submitted[1].lines[0].quantity, 1);
}

#[tokio::test]
async fn test_non_stock_rejection_fails_and_keeps_cart() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(5)]);
    backend.push_snapshot(&[tomato(5)]);
    backend.push_order_rejection("dirección inválida");
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    match &err {
        CheckoutError::Submission { message } => assert_eq!(message, "dirección inválida"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.phase(), CheckoutPhase::Failed);
    assert_eq!(notifier.kinds(), vec![NotificationKind::CheckoutFailed]);
    assert_eq!(backend.submitted().len(), 1);

    // Cart untouched, in memory and on disk
    assert_eq!(session.cart().lines()[0].quantity, 2);
    drop(session);
    assert_eq!(home.open_session().cart().lines()[0].quantity, 2);
}

#[tokio::test]
async fn test_submit_transport_error_fails() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    backend.push_snapshot(&[tomato(5)]);
    backend.push_snapshot(&[tomato(5)]);
    backend.push_order_error(ApiError::Status {
        status: 502,
        body: "bad gateway".to_string(),
    });
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    match &err {
        CheckoutError::Submission { message } => assert!(message.contains("502")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(notifier.kinds(), vec![NotificationKind::CheckoutFailed]);
    assert_eq!(session.cart().item_count(), 1);
}

#[tokio::test]
async fn test_snapshot_failure_halts_in_pre_reconcile() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session.cart_mut().add_or_increment(&tomato(5));

    let backend = TestBackend::new();
    backend.push_snapshot_error(ApiError::Status {
        status: 500,
        body: "boom".to_string(),
    });
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::SnapshotFetch { .. }));
    assert_eq!(err.phase(), CheckoutPhase::PreReconcile);
    assert_eq!(prompt.calls(), 0);
    assert!(backend.submitted().is_empty());
    assert!(notifier.kinds().is_empty());
}

#[tokio::test]
async fn test_remediation_emptying_cart_halts() {
    let home = TestHome::new();
    home.sign_in(&customer(3));
    let mut session = home.open_session();
    session
        .cart_mut()
        .add_or_increment(&product(7, "Frutilla", "2490", 2));

    let backend = TestBackend::new();
    backend.push_snapshot(&[]); // the only line's product vanished
    let prompt = ScriptedPrompt::always_apply();
    let notifier = RecordingNotifier::new();
    let orchestrator = CheckoutOrchestrator::new();

    let err = orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(prompt.calls(), 1);
    assert_eq!(backend.snapshot_fetches(), 1);
    assert!(backend.submitted().is_empty());
    drop(session);
    assert!(home.open_session().cart().is_empty());
}
