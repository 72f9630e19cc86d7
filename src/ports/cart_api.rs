use crate::domain::aggregates::{Cart, CartLine, NewCartLine};
use crate::domain::value_objects::{CartItemId, Quantity, UserId};
use crate::ServiceError;
use async_trait::async_trait;

/// Cart endpoints. The service behind them owns the authoritative cart.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Cart, ServiceError>;

    /// Adds a selection; the service merges it into an existing line when
    /// the product, color and size match, and returns the resulting line.
    async fn add_line(&self, user_id: &UserId, line: &NewCartLine) -> Result<CartLine, ServiceError>;

    async fn update_quantity(&self, cart_item_id: &CartItemId, quantity: Quantity) -> Result<(), ServiceError>;

    async fn remove_line(&self, cart_item_id: &CartItemId) -> Result<(), ServiceError>;

    /// Empties the user's cart. Clearing an empty cart succeeds.
    async fn clear_cart(&self, user_id: &UserId) -> Result<(), ServiceError>;
}
