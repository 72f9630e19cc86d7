mod common;

use assert_matches::assert_matches;
use common::{input, line, TestApp};
use rust_decimal_macros::dec;

use storefront_checkout::{Notification, OrderStatus, PaymentMethod, StorefrontError, Topic};

async fn place_order(app: &TestApp) -> storefront_checkout::domain::value_objects::OrderId {
    let cart = app.loaded_cart(vec![line("A", 1, dec!(300))]).await;
    let mut checkout = app.coordinator();
    checkout.submit(&app.session, cart.cart(), input(PaymentMethod::CashOnDelivery)).await.unwrap().order_id
}

#[tokio::test]
async fn test_orders_listed_newest_first() {
    let app = TestApp::new();
    let first = place_order(&app).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = place_order(&app).await;

    let mut history = app.history();
    let orders = history.refresh().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order_id, second);
    assert_eq!(orders[1].order_id, first);
}

#[tokio::test]
async fn test_pending_order_can_be_cancelled() {
    let app = TestApp::new();
    let id = place_order(&app).await;
    let mut history = app.history();
    history.refresh().await.unwrap();

    assert!(history.can_request_cancel(&id));
    assert_eq!(history.request_cancel(&id).await.unwrap(), OrderStatus::Cancelled);
    assert_eq!(history.order(&id).unwrap().status, OrderStatus::Cancelled);
    assert!(!history.can_request_cancel(&id));
}

#[tokio::test]
async fn test_shipped_order_cancel_is_refused_and_status_kept() {
    let app = TestApp::new();
    let id = place_order(&app).await;
    let orders: std::sync::Arc<dyn storefront_checkout::ports::OrderService> = app.orders.clone();
    orders.update_status(&id, OrderStatus::Processing).await.unwrap();
    orders.update_status(&id, OrderStatus::Shipped).await.unwrap();

    let mut history = app.history();
    history.refresh().await.unwrap();
    assert!(!history.can_request_cancel(&id));

    let err = history.request_cancel(&id).await.unwrap_err();
    assert_matches!(err, StorefrontError::Rejected(_));
    assert_eq!(history.order(&id).unwrap().status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_toggle_expands_and_collapses() {
    let app = TestApp::new();
    let id = place_order(&app).await;
    let mut history = app.history();
    history.refresh().await.unwrap();

    assert!(history.toggle(&id));
    assert!(history.is_expanded(&id));
    assert_eq!(history.expanded_orders().count(), 1);
    assert!(!history.toggle(&id));
    assert!(!history.is_expanded(&id));
    assert!(!history.toggle(&"missing".into()));
}

#[tokio::test]
async fn test_stock_notice_triggers_refresh() {
    let app = TestApp::new();
    let mut stock = app.bus.subscribe(Topic::StockChanged);
    let mut history = app.history();
    history.refresh().await.unwrap();
    assert!(history.orders().is_empty());

    place_order(&app).await;
    let notice = stock.try_recv().unwrap();
    assert!(history.on_notification(&notice).await.unwrap());
    assert_eq!(history.orders().len(), 1);

    let unrelated = Notification::CartChanged { user_id: "u1".into() };
    assert!(!history.on_notification(&unrelated).await.unwrap());
}

#[tokio::test]
async fn test_other_shoppers_orders_do_not_refresh() {
    let app = TestApp::new();
    let mut stock = app.bus.subscribe(Topic::StockChanged);
    let mut history = app.history();
    history.refresh().await.unwrap();

    let own = place_order(&app).await;
    let elsewhere = Notification::StockChanged { user_id: "u2".into(), order_id: "99".into(), lines: Vec::new() };
    assert!(!history.on_notification(&elsewhere).await.unwrap());
    assert!(history.orders().is_empty());

    let notice = stock.try_recv().unwrap();
    assert_matches!(&notice, Notification::StockChanged { user_id, order_id, .. } if user_id == app.session.user_id() && order_id == &own);
    assert!(history.on_notification(&notice).await.unwrap());
    assert_eq!(history.orders().len(), 1);
}
