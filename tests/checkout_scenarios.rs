//! End-to-end checkout runs against the in-memory order service and a
//! scripted payment widget.

mod common;

use assert_matches::assert_matches;
use common::{input, line, TestApp, PHONE};
use rust_decimal_macros::dec;

use storefront_checkout::adapters::memory::GatewayScript;
use storefront_checkout::services::{CheckoutInput, CheckoutState, Phase, ShippingInfo};
use storefront_checkout::{Escalation, OrderStatus, PaymentMethod, PaymentStatus, ServiceError, StorefrontError, Topic};

// ==================== Cash on delivery ====================

#[tokio::test]
async fn test_cod_checkout_records_pending_payment() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let receipt = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap();

    assert_eq!(receipt.amount, dec!(1000));
    assert_eq!(receipt.payment_status, PaymentStatus::Pending);
    assert!(receipt.transaction_id.starts_with("COD-"));
    assert_eq!(checkout.phase(), Phase::Completed);

    let payments = app.orders.payments_for_order(&receipt.order_id).await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount, dec!(1000));
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert_eq!(payments[0].method, PaymentMethod::CashOnDelivery);

    let mut history = app.history();
    history.refresh().await.unwrap();
    let order = history.order(&receipt.order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec!(1000));
    assert_eq!(order.payment_status, Some(PaymentStatus::Pending));
}

#[tokio::test]
async fn test_cod_never_opens_the_gateway() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 1, dec!(250))]).await;
    let mut checkout = app.coordinator();

    checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap();
    assert!(app.gateway.requests().await.is_empty());
}

// ==================== Online gateway ====================

#[tokio::test]
async fn test_online_checkout_is_paid_and_amount_matches_total() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let receipt = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap();

    assert_eq!(receipt.payment_status, PaymentStatus::Paid);
    assert_eq!(receipt.transaction_id, "pay_test_1");
    assert_eq!(app.orders.orders().await.len(), 1);

    let order = app.orders.order(&receipt.order_id).await.unwrap();
    let payments = app.orders.payments_for_order(&receipt.order_id).await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount, order.total_amount);
    assert_eq!(payments[0].transaction_id, "pay_test_1");
}

#[tokio::test]
async fn test_gateway_receives_minor_units_and_prefill() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let receipt = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap();

    let requests = app.gateway.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount_minor_units, 100_000);
    assert_eq!(requests[0].currency, "INR");
    assert_eq!(requests[0].order_reference, receipt.order_id);
    assert_eq!(requests[0].prefill.contact, PHONE);
    assert_eq!(requests[0].prefill.email.as_deref(), Some("asha@example.com"));
}

#[tokio::test]
async fn test_dismissed_gateway_leaves_pending_order_without_payment() {
    let app = TestApp::new();
    app.gateway.set_script(GatewayScript::Dismiss).await;
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap_err();

    let order_id = assert_matches!(&err, StorefrontError::GatewayDismissed { order_id } => order_id.clone());
    assert_eq!(err.escalation(), Escalation::Notice);
    assert_eq!(checkout.phase(), Phase::Failed);
    assert_eq!(app.orders.order(&order_id).await.unwrap().status, OrderStatus::Pending);
    assert!(app.orders.payments_for_order(&order_id).await.is_empty());
    assert_eq!(app.orders.record_calls().await, 0);

    checkout.restart();
    assert_eq!(checkout.phase(), Phase::CollectingInfo);
    assert_eq!(checkout.state().notice().map(ToString::to_string).as_deref(), Some("payment cancelled"));
    assert!(checkout.submit_enabled());
}

#[tokio::test]
async fn test_abandoned_widget_counts_as_dismissal() {
    let app = TestApp::new();
    app.gateway.set_script(GatewayScript::Abandon).await;
    let cart = app.loaded_cart(vec![line("A", 1, dec!(99))]).await;
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap_err();
    assert_matches!(err, StorefrontError::GatewayDismissed { .. });
}

#[tokio::test]
async fn test_unavailable_gateway_fails_without_payment() {
    let app = TestApp::new();
    app.gateway.set_script(GatewayScript::Unavailable("script blocked".into())).await;
    let cart = app.loaded_cart(vec![line("A", 1, dec!(99))]).await;
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap_err();
    assert_matches!(err, StorefrontError::Gateway(_));
    assert_matches!(checkout.state(), CheckoutState::Failed { stage: Phase::AwaitingPayment, order_id: Some(_), .. });
    assert_eq!(app.orders.record_calls().await, 0);
}

#[tokio::test]
async fn test_unrecorded_online_payment_escalates() {
    let app = TestApp::new();
    app.orders.fail_next_record_payment(ServiceError::Network("connection reset".into())).await;
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap_err();

    assert_matches!(&err, StorefrontError::Confirmation { transaction_id, .. } if transaction_id == "pay_test_1");
    assert_eq!(err.escalation(), Escalation::PersistentBanner);
    assert!(err.orphaned_order().is_some());
    assert_matches!(checkout.state(), CheckoutState::Failed { stage: Phase::ConfirmingPayment, .. });
}

#[tokio::test]
async fn test_unrecorded_cod_payment_is_an_ordinary_failure() {
    let app = TestApp::new();
    app.orders.fail_next_record_payment(ServiceError::Network("connection reset".into())).await;
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap_err();
    assert_matches!(err, StorefrontError::Network(_));
    assert_eq!(err.escalation(), Escalation::Retry);
}

#[tokio::test]
async fn test_gateway_receives_configured_merchant_key() {
    let mut app = TestApp::new();
    app.config.gateway_key = Some("rzp_test_key".into());
    let cart = app.loaded_cart(vec![line("A", 1, dec!(99))]).await;
    let mut checkout = app.coordinator();

    checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap();

    let requests = app.gateway.requests().await;
    assert_eq!(requests[0].merchant_key.as_deref(), Some("rzp_test_key"));
}

#[tokio::test]
async fn test_amount_beyond_minor_unit_range_fails_before_the_widget() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 1, dec!(100000000000000000))]).await;
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap_err();

    assert_matches!(err, StorefrontError::Money(_));
    assert_matches!(checkout.state(), CheckoutState::Failed { stage: Phase::AwaitingPayment, order_id: Some(_), .. });
    assert!(app.gateway.requests().await.is_empty());
    assert_eq!(app.orders.record_calls().await, 0);
}

#[tokio::test]
async fn test_cancelled_notice_survives_invalid_resubmission() {
    let app = TestApp::new();
    app.gateway.set_script(GatewayScript::Dismiss).await;
    let cart = app.loaded_cart(vec![line("A", 1, dec!(99))]).await;
    let mut checkout = app.coordinator();

    checkout.submit(&app.session, cart.cart(), input(PaymentMethod::OnlineGateway)).await.unwrap_err();
    checkout.restart();

    let bad = CheckoutInput { shipping: ShippingInfo::new("", PHONE), payment_method: PaymentMethod::OnlineGateway };
    let err = checkout.submit(&app.session, cart.cart(), bad).await.unwrap_err();

    assert_matches!(err, StorefrontError::Validation(_));
    assert_eq!(checkout.phase(), Phase::CollectingInfo);
    assert!(checkout.state().field_errors().is_some());
    assert_eq!(checkout.state().notice().map(ToString::to_string).as_deref(), Some("payment cancelled"));
}

// ==================== Validation and guards ====================

#[tokio::test]
async fn test_invalid_shipping_never_reaches_the_service() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 1, dec!(10))]).await;
    let mut checkout = app.coordinator();

    let bad = CheckoutInput { shipping: ShippingInfo::new("", "12345"), payment_method: PaymentMethod::CashOnDelivery };
    let err = checkout.submit(&app.session, cart.cart(), bad).await.unwrap_err();

    let errors = assert_matches!(err, StorefrontError::Validation(errors) => errors);
    assert!(errors.field_errors().contains_key("address"));
    assert!(errors.field_errors().contains_key("phone"));
    assert_eq!(checkout.phase(), Phase::CollectingInfo);
    assert!(checkout.state().field_errors().is_some());
    assert_eq!(app.orders.create_calls().await, 0);
}

#[tokio::test]
async fn test_empty_cart_is_rejected_locally() {
    let app = TestApp::new();
    let cart = app.cart_repository();
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap_err();
    let errors = assert_matches!(err, StorefrontError::Validation(errors) => errors);
    assert!(errors.field_errors().contains_key("items"));
    assert_eq!(app.orders.create_calls().await, 0);
}

#[tokio::test]
async fn test_create_failure_leaves_cart_untouched() {
    let app = TestApp::new();
    app.orders.fail_next_create(ServiceError::Network("timeout".into())).await;
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let before = cart.cart().clone();
    let mut checkout = app.coordinator();

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap_err();

    assert_matches!(err, StorefrontError::Network(_));
    assert_matches!(checkout.state(), CheckoutState::Failed { stage: Phase::CreatingOrder, order_id: None, .. });
    assert_eq!(cart.cart(), &before);
    assert_eq!(app.carts.lines(app.session.user_id()).await.len(), 1);
    assert!(app.orders.orders().await.is_empty());
}

#[tokio::test]
async fn test_second_submission_is_refused() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 1, dec!(10))]).await;
    let mut checkout = app.coordinator();

    checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap();
    assert!(!checkout.submit_enabled());

    let err = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap_err();
    assert_matches!(err, StorefrontError::InvalidState(_));
    assert_eq!(app.orders.create_calls().await, 1);
}

#[tokio::test]
async fn test_snapshot_is_frozen_at_submit() {
    let app = TestApp::new();
    let mut cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut checkout = app.coordinator();

    let receipt = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap();
    let id = cart.cart().lines()[0].cart_item_id.clone();
    cart.update_quantity(&id, 7).await.unwrap();

    let order = app.orders.order(&receipt.order_id).await.unwrap();
    assert_eq!(order.lines[0].quantity(), 2);
    assert_eq!(order.total_amount, dec!(1000));
}

// ==================== Notifications and phases ====================

#[tokio::test]
async fn test_completion_publishes_stock_and_cart_notices() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 2, dec!(500))]).await;
    let mut stock = app.bus.subscribe(Topic::StockChanged);
    let mut carts = app.bus.subscribe(Topic::CartChanged);
    let mut checkout = app.coordinator();

    let receipt = checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap();

    let notice = stock.try_recv().unwrap();
    assert_matches!(notice, storefront_checkout::Notification::StockChanged { order_id, lines, .. } if order_id == receipt.order_id && lines.len() == 1);
    assert!(carts.try_recv().is_some());
    assert!(stock.try_recv().is_none());
}

#[tokio::test]
async fn test_phase_watchers_see_the_final_phase() {
    let app = TestApp::new();
    let cart = app.loaded_cart(vec![line("A", 1, dec!(10))]).await;
    let mut checkout = app.coordinator();
    let watcher = checkout.watch_phase();

    checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap();
    assert_eq!(*watcher.borrow(), Phase::Completed);

    checkout.restart();
    assert_eq!(*watcher.borrow(), Phase::CollectingInfo);
    assert!(checkout.state().notice().is_none());
}
