//! Order history view model

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::events::Notification;
use crate::domain::value_objects::{OrderId, UserId};
use crate::ports::OrderService;
use crate::{Result, StorefrontError};

/// A user's orders, newest first, with per-order expand/collapse.
///
/// Nothing here is assumed after a request: every change is read back from
/// the order service.
pub struct OrderHistoryView {
    orders_api: Arc<dyn OrderService>,
    user_id: UserId,
    orders: Vec<Order>,
    expanded: HashSet<OrderId>,
}

impl OrderHistoryView {
    pub fn new(orders_api: Arc<dyn OrderService>, user_id: UserId) -> Self {
        Self { orders_api, user_id, orders: vec![], expanded: HashSet::new() }
    }

    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn orders(&self) -> &[Order] { &self.orders }
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> { self.orders.iter().find(|o| &o.order_id == order_id) }
    pub fn is_expanded(&self, order_id: &OrderId) -> bool { self.expanded.contains(order_id) }

    /// Orders currently showing their details.
    pub fn expanded_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| self.expanded.contains(&o.order_id))
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn refresh(&mut self) -> Result<&[Order]> {
        let mut orders = self.orders_api.orders_for_user(&self.user_id).await?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        self.expanded.retain(|id| orders.iter().any(|o| &o.order_id == id));
        self.orders = orders;
        Ok(&self.orders)
    }

    /// Flips an order between expanded and collapsed; returns the new state.
    pub fn toggle(&mut self, order_id: &OrderId) -> bool {
        if self.expanded.remove(order_id) {
            return false;
        }
        if self.order(order_id).is_none() {
            return false;
        }
        self.expanded.insert(order_id.clone());
        true
    }

    /// Whether to offer a cancel button. The service still decides.
    pub fn can_request_cancel(&self, order_id: &OrderId) -> bool {
        self.order(order_id).map(Order::can_request_cancel).unwrap_or(false)
    }

    /// Sends a cancellation request, then re-fetches and returns the status
    /// the service reports for the order.
    #[instrument(skip(self))]
    pub async fn request_cancel(&mut self, order_id: &OrderId) -> Result<OrderStatus> {
        let outcome = self.orders_api.cancel_order(order_id).await;
        let refreshed = self.refresh().await.map(|_| ());

        if let Err(e) = outcome {
            warn!(%order_id, error = %e, "Cancellation refused");
            return Err(e.into());
        }
        refreshed?;
        let status = self
            .order(order_id)
            .map(Order::status)
            .ok_or_else(|| StorefrontError::NotFound(format!("order {}", order_id)))?;
        info!(%order_id, %status, "Cancellation processed");
        Ok(status)
    }

    /// Re-fetches when this user places an order. Returns whether a
    /// refresh happened.
    pub async fn on_notification(&mut self, notification: &Notification) -> Result<bool> {
        match notification {
            Notification::StockChanged { user_id, .. } if user_id == &self.user_id => {
                self.refresh().await?;
                Ok(true)
            }
            Notification::StockChanged { .. } | Notification::CartChanged { .. } | Notification::WishlistChanged { .. } => Ok(false),
        }
    }
}
