//! Refresh notices exchanged between independently rendered views
use crate::domain::aggregates::OrderLine;
use crate::domain::value_objects::{OrderId, ProductId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    CartChanged,
    StockChanged,
    WishlistChanged,
}

/// One payload shape per topic. Payloads are hints: receivers re-fetch
/// canonical state instead of applying them.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    CartChanged { user_id: UserId },
    /// Published when `user_id` places an order; `lines` names the stock entries to refresh
    StockChanged { user_id: UserId, order_id: OrderId, lines: Vec<OrderLine> },
    WishlistChanged { user_id: UserId, product_id: Option<ProductId> },
}

impl Notification {
    pub fn topic(&self) -> Topic {
        match self {
            Notification::CartChanged { .. } => Topic::CartChanged,
            Notification::StockChanged { .. } => Topic::StockChanged,
            Notification::WishlistChanged { .. } => Topic::WishlistChanged,
        }
    }
}
