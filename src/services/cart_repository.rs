//! Local view of the shopper's cart, kept in step with the cart service
//!
//! Mutations are optimistic: local state changes first, the request goes
//! out, and a failed request puts the previous state back before the error
//! is returned. Each successful mutation publishes one cart-changed notice.
//!
//! A completed checkout does not touch the cart by itself; the caller hands
//! the receipt to [`CartRepository::checkout_completed`] so the frozen lines
//! leave the cart and cannot be ordered twice.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::aggregates::{Cart, CartLine, NewCartLine};
use crate::domain::events::Notification;
use crate::domain::value_objects::{CartItemId, Quantity, UserId};
use crate::ports::CartApi;
use crate::services::bus::NotificationBus;
use crate::services::checkout::CheckoutReceipt;
use crate::{Result, ServiceError, StorefrontError};
use rust_decimal::Decimal;

pub struct CartRepository {
    api: Arc<dyn CartApi>,
    bus: NotificationBus,
    cart: Cart,
}

impl CartRepository {
    /// Starts with an empty local cart for `user_id`; call [`fetch`](Self::fetch) to load it.
    pub fn new(api: Arc<dyn CartApi>, bus: NotificationBus, user_id: UserId) -> Self {
        Self { api, bus, cart: Cart::new(user_id) }
    }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn user_id(&self) -> &UserId { self.cart.user_id() }
    pub fn subtotal(&self) -> Result<Decimal> { Ok(self.cart.subtotal()?) }
    pub fn line_count(&self) -> usize { self.cart.line_count() }

    /// Replaces local state with the service's cart for `user_id`.
    #[instrument(skip(self))]
    pub async fn fetch(&mut self, user_id: &UserId) -> Result<&Cart> {
        let cart = self.api.fetch_cart(user_id).await?;
        debug!(lines = cart.line_count(), "Fetched cart");
        self.cart = cart;
        Ok(&self.cart)
    }

    #[instrument(skip(self, line), fields(product_id = %line.product_id))]
    pub async fn add_item(&mut self, line: NewCartLine) -> Result<&CartLine> {
        let user_id = self.cart.user_id().clone();
        let confirmed = self.api.add_line(&user_id, &line).await?;
        info!(cart_item_id = %confirmed.cart_item_id, quantity = confirmed.quantity.value(), "Added to cart");
        let id = confirmed.cart_item_id.clone();
        self.cart.replace_line(confirmed);
        self.notify();
        self.cart.line(&id).ok_or_else(|| StorefrontError::NotFound(format!("cart item {}", id)))
    }

    /// Rejects `quantity < 1` without contacting the service.
    #[instrument(skip(self))]
    pub async fn update_quantity(&mut self, cart_item_id: &CartItemId, quantity: i64) -> Result<()> {
        let quantity = Quantity::new(quantity)?;
        let previous = self.cart.clone();
        self.cart.set_quantity(cart_item_id, quantity).map_err(|e| StorefrontError::NotFound(e.to_string()))?;

        let result = self.api.update_quantity(cart_item_id, quantity).await;
        self.reconcile(previous, result)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, cart_item_id: &CartItemId) -> Result<()> {
        let previous = self.cart.clone();
        self.cart.remove(cart_item_id).map_err(|e| StorefrontError::NotFound(e.to_string()))?;

        let result = self.api.remove_line(cart_item_id).await;
        self.reconcile(previous, result)
    }

    /// Clearing an already-empty cart succeeds and leaves it empty.
    #[instrument(skip(self))]
    pub async fn clear(&mut self, user_id: &UserId) -> Result<()> {
        let previous = self.cart.clone();
        if self.cart.user_id() == user_id {
            self.cart.clear();
        } else {
            self.cart = Cart::new(user_id.clone());
        }

        let result = self.api.clear_cart(user_id).await;
        self.reconcile(previous, result)
    }

    /// Removes the lines `receipt` froze into its order. Lines added after the
    /// order was submitted stay in the cart.
    #[instrument(skip(self, receipt), fields(order_id = %receipt.order_id))]
    pub async fn checkout_completed(&mut self, receipt: &CheckoutReceipt) -> Result<()> {
        let ordered: Vec<CartItemId> = self
            .cart
            .lines()
            .iter()
            .filter(|line| {
                receipt.lines.iter().any(|o| {
                    o.product_id() == &line.product_id && o.color_id() == line.color_id.as_ref() && o.size_id() == line.size_id.as_ref()
                })
            })
            .map(|line| line.cart_item_id.clone())
            .collect();

        if ordered.len() == self.cart.line_count() {
            let user_id = self.cart.user_id().clone();
            self.clear(&user_id).await?;
        } else {
            for id in &ordered {
                self.remove_item(id).await?;
            }
        }
        info!(removed = ordered.len(), remaining = self.cart.line_count(), "Ordered lines left the cart");
        Ok(())
    }

    fn reconcile(&mut self, previous: Cart, result: std::result::Result<(), ServiceError>) -> Result<()> {
        match result {
            Ok(()) => {
                self.notify();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Cart update failed, reverting local change");
                self.cart = previous;
                Err(e.into())
            }
        }
    }

    fn notify(&self) {
        self.bus.publish(Notification::CartChanged { user_id: self.cart.user_id().clone() });
    }
}
