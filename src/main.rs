//! Storefront checkout - walks a cart through cash-on-delivery and online checkout

use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_checkout::adapters::memory::{GatewayScript, InMemoryCartApi, InMemoryOrderService, ScriptedGateway};
use storefront_checkout::adapters::{HttpCartApi, HttpClient, HttpOrderService};
use storefront_checkout::domain::aggregates::LineDisplay;
use storefront_checkout::domain::value_objects::Quantity;
use storefront_checkout::ports::{CartApi, OrderService};
use storefront_checkout::services::{CheckoutInput, ShippingInfo};
use storefront_checkout::{CartRepository, CheckoutCoordinator, ClientConfig, NewCartLine, NotificationBus, OrderHistoryView, PaymentMethod, Session, Topic};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = ClientConfig::from_env()?;
    let session = Session::new("demo-user").with_contact(Some("Demo Shopper".into()), Some("demo@example.com".into()), Some("9876543210".into()));

    let remote = std::env::args().any(|a| a == "--remote");
    let (carts, orders): (Arc<dyn CartApi>, Arc<dyn OrderService>) = if remote {
        let http = HttpClient::new(&config).with_session(&session);
        tracing::info!(api_url = %config.api_url, "Using remote cart and order services");
        (Arc::new(HttpCartApi::new(http.clone())), Arc::new(HttpOrderService::new(http)))
    } else {
        (Arc::new(InMemoryCartApi::new()), Arc::new(InMemoryOrderService::new()))
    };
    let gateway = Arc::new(ScriptedGateway::new(GatewayScript::Succeed(format!("pay_{}", uuid::Uuid::new_v4().simple()))));
    let bus = NotificationBus::new();
    let mut stock_updates = bus.subscribe(Topic::StockChanged);

    let mut cart = CartRepository::new(carts, bus.clone(), session.user_id().clone());
    let mut coordinator = CheckoutCoordinator::new(orders.clone(), gateway, bus.clone(), &config);
    let mut history = OrderHistoryView::new(orders, session.user_id().clone());

    for method in [PaymentMethod::CashOnDelivery, PaymentMethod::OnlineGateway] {
        cart.fetch(session.user_id()).await?;
        if cart.cart().is_empty() {
            cart.add_item(NewCartLine {
                product_id: "sku-kurta".into(),
                color_id: Some("indigo".into()),
                size_id: Some("M".into()),
                quantity: Quantity::new(2)?,
                unit_price: Decimal::new(500, 0),
                display: LineDisplay { name: "Cotton Kurta".into(), color: Some("Indigo".into()), image: None },
            }).await?;
        }
        let subtotal = cart.subtotal()?;
        tracing::info!(%subtotal, %method, "Checking out");

        let shipping = ShippingInfo { address: "12 Residency Road, Bengaluru".into(), ..ShippingInfo::prefilled(&session) };
        match coordinator.submit(&session, cart.cart(), CheckoutInput { shipping, payment_method: method }).await {
            Ok(receipt) => {
                tracing::info!(order_id = %receipt.order_id, amount = %receipt.amount, payment_status = %receipt.payment_status, "Order placed");
                cart.checkout_completed(&receipt).await?;
            }
            Err(e) => tracing::error!(error = %e, escalation = ?e.escalation(), "Checkout failed"),
        }
        coordinator.restart();

        if let Some(notice) = stock_updates.try_recv() {
            history.on_notification(&notice).await?;
        }
    }

    for order in history.orders() {
        tracing::info!(order_id = %order.order_id, status = %order.status, total = %order.total_amount, payment = ?order.payment_status, "Order history");
    }
    Ok(())
}
