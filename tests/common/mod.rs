//! Shared fixtures for the integration tests

#![allow(dead_code)]

use rust_decimal::Decimal;
use std::sync::Arc;

use storefront_checkout::adapters::memory::{GatewayScript, InMemoryCartApi, InMemoryOrderService, ScriptedGateway};
use storefront_checkout::domain::aggregates::LineDisplay;
use storefront_checkout::domain::value_objects::Quantity;
use storefront_checkout::services::{CheckoutInput, ShippingInfo};
use storefront_checkout::{CartRepository, CheckoutCoordinator, ClientConfig, NewCartLine, NotificationBus, OrderHistoryView, PaymentMethod, Session};

pub const PHONE: &str = "9876543210";

pub struct TestApp {
    pub carts: Arc<InMemoryCartApi>,
    pub orders: Arc<InMemoryOrderService>,
    pub gateway: Arc<ScriptedGateway>,
    pub bus: NotificationBus,
    pub config: ClientConfig,
    pub session: Session,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            carts: Arc::new(InMemoryCartApi::new()),
            orders: Arc::new(InMemoryOrderService::new()),
            gateway: Arc::new(ScriptedGateway::new(GatewayScript::Succeed("pay_test_1".into()))),
            bus: NotificationBus::new(),
            config: ClientConfig::default(),
            session: Session::new("u1").with_contact(Some("Asha Rao".into()), Some("asha@example.com".into()), Some(PHONE.into())),
        }
    }

    pub fn cart_repository(&self) -> CartRepository {
        CartRepository::new(self.carts.clone(), self.bus.clone(), self.session.user_id().clone())
    }

    pub fn coordinator(&self) -> CheckoutCoordinator {
        CheckoutCoordinator::new(self.orders.clone(), self.gateway.clone(), self.bus.clone(), &self.config)
    }

    pub fn history(&self) -> OrderHistoryView {
        OrderHistoryView::new(self.orders.clone(), self.session.user_id().clone())
    }

    /// Seeds the service-side cart and returns a repository that has fetched it.
    pub async fn loaded_cart(&self, lines: Vec<NewCartLine>) -> CartRepository {
        self.carts.seed(self.session.user_id(), lines).await;
        let mut repository = self.cart_repository();
        repository.fetch(self.session.user_id()).await.unwrap();
        repository
    }
}

pub fn line(product: &str, quantity: i64, price: Decimal) -> NewCartLine {
    NewCartLine {
        product_id: product.into(),
        color_id: None,
        size_id: None,
        quantity: Quantity::new(quantity).unwrap(),
        unit_price: price,
        display: LineDisplay { name: format!("Product {}", product), ..LineDisplay::default() },
    }
}

pub fn input(method: PaymentMethod) -> CheckoutInput {
    CheckoutInput { shipping: ShippingInfo::new("X", PHONE), payment_method: method }
}
