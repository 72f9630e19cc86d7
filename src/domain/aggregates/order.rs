//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::aggregates::cart::CartLine;
use crate::domain::aggregates::payment::PaymentStatus;
use crate::domain::value_objects::{line_amount, total_amount, ColorId, MoneyError, OrderId, ProductId, SizeId, UserId};

/// Immutable record of a completed checkout request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub address: String,
    pub phone: String,
    /// Fixed when the order is created
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    /// Latest payment state reported alongside the order, when the service sends one
    pub payment_status: Option<PaymentStatus>,
}

/// A cart line frozen at order creation. Fields are private so a written
/// line cannot be edited afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    product_id: ProductId,
    color_id: Option<ColorId>,
    size_id: Option<SizeId>,
    quantity: u32,
    price: Decimal,
}

impl OrderLine {
    pub fn new(product_id: ProductId, color_id: Option<ColorId>, size_id: Option<SizeId>, quantity: u32, price: Decimal) -> Self {
        Self { product_id, color_id, size_id, quantity, price }
    }

    pub fn from_cart_line(line: &CartLine) -> Self {
        Self::new(line.product_id.clone(), line.color_id.clone(), line.size_id.clone(), line.quantity.value(), line.unit_price)
    }

    pub fn product_id(&self) -> &ProductId { &self.product_id }
    pub fn color_id(&self) -> Option<&ColorId> { self.color_id.as_ref() }
    pub fn size_id(&self) -> Option<&SizeId> { self.size_id.as_ref() }
    pub fn quantity(&self) -> u32 { self.quantity }
    pub fn price(&self) -> Decimal { self.price }
    pub fn total(&self) -> Result<Decimal, MoneyError> { line_amount(self.price, self.quantity) }
}

/// Σ price × quantity over a set of order lines
pub fn lines_total(lines: &[OrderLine]) -> Result<Decimal, MoneyError> { total_amount(lines.iter().map(OrderLine::total)) }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus { #[default] Pending, PaymentInitiated, Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    /// Transitions the order service accepts.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, PaymentInitiated) | (Pending, Processing) | (Pending, Cancelled)
                | (PaymentInitiated, Processing) | (PaymentInitiated, Cancelled)
                | (Processing, Shipped)
                | (Shipped, Delivered)
        )
    }

    pub fn is_cancellable(self) -> bool { matches!(self, OrderStatus::Pending | OrderStatus::PaymentInitiated) }
    pub fn is_terminal(self) -> bool { matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled) }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::PaymentInitiated => "PaymentInitiated",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Accepts the casings and separators upstream services use,
/// e.g. `pending`, `PAYMENT_INITIATED`, `Payment Initiated`, `canceled`.
impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect();
        match key.as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paymentinitiated" => Ok(OrderStatus::PaymentInitiated),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Unknown status '{}'", self.0) }
}

impl Order {
    pub fn status(&self) -> OrderStatus { self.status }

    /// Client-side hint only; the order service decides.
    pub fn can_request_cancel(&self) -> bool { self.status.is_cancellable() }
}
