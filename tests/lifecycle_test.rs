mod common;

use bigdecimal::BigDecimal;
use std::str::FromStr;

use gatepass_core::domain::OrderStatus;
use gatepass_core::error::AppError;
use gatepass_core::ledger::Ledger;
use gatepass_core::services::lifecycle::CreateOrderInput;

fn order_input(user_id: Option<&str>) -> CreateOrderInput {
    CreateOrderInput {
        event_id: "EV-1".to_string(),
        amount: BigDecimal::from(250),
        buyer_email: "a@b.com".to_string(),
        buyer_user_id: user_id.map(str::to_string),
    }
}

#[tokio::test]
async fn create_order_starts_pending_with_unique_ids() {
    let stack = common::stack();

    let first = stack.service.create_order(order_input(None)).await.unwrap();
    let second = stack.service.create_order(order_input(None)).await.unwrap();

    assert_eq!(first.status, OrderStatus::Pending);
    assert_eq!(first.amount, BigDecimal::from_str("250.00").unwrap());
    assert_eq!(first.currency, "INR");
    assert!(first.txn_reference.is_none());
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn create_order_rejects_zero_amount() {
    let stack = common::stack();
    let mut input = order_input(None);
    input.amount = BigDecimal::from(0);

    let err = stack.service.create_order(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn create_order_rejects_empty_event_id() {
    let stack = common::stack();
    let mut input = order_input(None);
    input.event_id = "   ".to_string();

    let err = stack.service.create_order(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn confirm_fulfills_and_replay_is_idempotent() {
    let stack = common::stack();
    let order = stack
        .service
        .create_order(order_input(Some("user-1")))
        .await
        .unwrap();

    let confirmed = stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Fulfilled);
    assert_eq!(confirmed.txn_reference.as_deref(), Some("TXN123"));

    // one delivery, carrying the rendered document for this order
    let sent = stack.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@b.com");
    assert_eq!(sent[0].attachment_name, format!("ticket-{}.html", order.id));
    let document = String::from_utf8(sent[0].attachment.clone()).unwrap();
    assert!(document.contains(&order.id.to_string()));
    assert!(document.contains("TXN123"));

    // local copy discarded after the transport accepted the message
    assert!(!stack.renderer.artifact_path(order.id).exists());

    // booking recorded for the authenticated buyer
    let bookings = stack.ledger.list_bookings_for_user("user-1").await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].order_id, Some(order.id));
    assert_eq!(bookings[0].txn_reference, "TXN123");

    // replaying the same confirmation changes nothing and sends nothing
    let replayed = stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap();
    assert_eq!(replayed.status, OrderStatus::Fulfilled);
    assert_eq!(stack.mailer.sent().len(), 1);
    assert_eq!(
        stack
            .ledger
            .list_bookings_for_user("user-1")
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn concurrent_confirms_have_exactly_one_winner() {
    let stack = common::stack();
    let order = stack.service.create_order(order_input(None)).await.unwrap();

    let a = {
        let service = stack.service.clone();
        let id = order.id;
        tokio::spawn(async move { service.confirm_payment(id, "TXN-A").await })
    };
    let b = {
        let service = stack.service.clone();
        let id = order.id;
        tokio::spawn(async move { service.confirm_payment(id, "TXN-B").await })
    };

    let _ = a.await.unwrap();
    let _ = b.await.unwrap();

    let current = stack.ledger.get_order(order.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Fulfilled);
    let reference = current.txn_reference.as_deref().unwrap();
    assert!(reference == "TXN-A" || reference == "TXN-B");

    // exactly one logical ticket was delivered
    let sent = stack.mailer.sent();
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn delivery_failure_leaves_order_retriable_then_fulfills_once() {
    let stack = common::stack();
    let order = stack.service.create_order(order_input(None)).await.unwrap();

    stack.mailer.set_failing(true);
    let err = stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Fulfillment(_)));

    let failed = stack.ledger.get_order(order.id).await.unwrap();
    assert_eq!(failed.status, OrderStatus::Failed);
    assert!(failed.failure_reason.as_deref().unwrap().contains("delivery"));
    // payment proof survives the failure
    assert_eq!(failed.txn_reference.as_deref(), Some("TXN123"));
    // undelivered artifact is kept for the retry
    assert!(stack.renderer.artifact_path(order.id).exists());

    // same confirmation again, relay back up
    stack.mailer.set_failing(false);
    let fulfilled = stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap();
    assert_eq!(fulfilled.status, OrderStatus::Fulfilled);
    assert!(fulfilled.failure_reason.is_none());
    assert_eq!(stack.mailer.sent().len(), 1);
    assert!(!stack.renderer.artifact_path(order.id).exists());

    // and a further replay stays put
    let replayed = stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap();
    assert_eq!(replayed.status, OrderStatus::Fulfilled);
    assert_eq!(stack.mailer.sent().len(), 1);
}

#[tokio::test]
async fn anonymous_orders_produce_no_booking() {
    let stack = common::stack();
    let order = stack.service.create_order(order_input(None)).await.unwrap();

    stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap();

    // nothing listed for any user; the ticket email is the buyer's proof
    assert!(stack
        .ledger
        .list_bookings_for_user("user-1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn duplicate_references_across_orders_are_accepted() {
    let stack = common::stack();
    let first = stack.service.create_order(order_input(None)).await.unwrap();
    let second = stack.service.create_order(order_input(None)).await.unwrap();

    let a = stack
        .service
        .confirm_payment(first.id, "TXN-SAME")
        .await
        .unwrap();
    let b = stack
        .service
        .confirm_payment(second.id, "TXN-SAME")
        .await
        .unwrap();

    assert_eq!(a.status, OrderStatus::Fulfilled);
    assert_eq!(b.status, OrderStatus::Fulfilled);
    assert_eq!(stack.mailer.sent().len(), 2);
}

#[tokio::test]
async fn payment_link_moves_order_to_awaiting_confirmation() {
    let stack = common::stack();
    let order = stack.service.create_order(order_input(None)).await.unwrap();

    let (link, updated) = stack.service.issue_payment_link(order.id).await.unwrap();
    assert!(link.starts_with("upi://pay?pa=events@okbank&"));
    assert!(link.contains(&format!("&tr={}", order.id)));
    assert!(link.contains("&am=250.00&"));
    assert_eq!(updated.status, OrderStatus::AwaitingConfirmation);

    // issuing the link twice is harmless
    let (link_again, again) = stack.service.issue_payment_link(order.id).await.unwrap();
    assert_eq!(link, link_again);
    assert_eq!(again.status, OrderStatus::AwaitingConfirmation);

    // confirmation still lands
    let confirmed = stack
        .service
        .confirm_payment(order.id, "TXN123")
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Fulfilled);
}

#[tokio::test]
async fn confirm_unknown_order_is_not_found() {
    let stack = common::stack();
    let err = stack
        .service
        .confirm_payment(uuid::Uuid::new_v4(), "TXN123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
