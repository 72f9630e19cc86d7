use crate::domain::aggregates::{Cart, CartLine, NewCartLine};
use crate::domain::value_objects::{CartItemId, Quantity, UserId};
use crate::ports::CartApi;
use crate::ServiceError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct CartData {
    carts: HashMap<UserId, Vec<CartLine>>,
    next_item_id: u64,
    calls: usize,
    fail_next: Option<ServiceError>,
}

impl CartData {
    /// Counts the call and hands back an injected failure, if one is armed.
    fn begin(&mut self) -> Result<(), ServiceError> {
        self.calls += 1;
        match self.fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn find_line(&self, id: &CartItemId) -> Option<(&UserId, usize)> {
        self.carts.iter().find_map(|(user, lines)| lines.iter().position(|l| &l.cart_item_id == id).map(|i| (user, i)))
    }
}

/// In-memory cart service
#[derive(Default)]
pub struct InMemoryCartApi {
    data: RwLock<CartData>,
}

impl InMemoryCartApi {
    pub fn new() -> Self { Self::default() }

    /// Adds lines directly, without counting as calls.
    pub async fn seed(&self, user_id: &UserId, lines: Vec<NewCartLine>) -> Vec<CartLine> {
        let mut data = self.data.write().await;
        lines.into_iter().map(|line| insert(&mut data, user_id, line)).collect()
    }

    /// Makes the next call fail with `error`.
    pub async fn fail_next(&self, error: ServiceError) { self.data.write().await.fail_next = Some(error); }

    /// Number of requests received so far.
    pub async fn calls(&self) -> usize { self.data.read().await.calls }

    pub async fn lines(&self, user_id: &UserId) -> Vec<CartLine> {
        self.data.read().await.carts.get(user_id).cloned().unwrap_or_default()
    }
}

fn insert(data: &mut CartData, user_id: &UserId, line: NewCartLine) -> CartLine {
    let lines = data.carts.entry(user_id.clone()).or_default();
    if let Some(existing) = lines.iter_mut().find(|l| l.same_selection(&line.product_id, &line.color_id, &line.size_id)) {
        existing.quantity = existing.quantity.add(line.quantity);
        return existing.clone();
    }
    data.next_item_id += 1;
    let created = CartLine {
        cart_item_id: CartItemId::new(data.next_item_id.to_string()),
        product_id: line.product_id,
        color_id: line.color_id,
        size_id: line.size_id,
        quantity: line.quantity,
        unit_price: line.unit_price,
        display: line.display,
    };
    data.carts.entry(user_id.clone()).or_default().push(created.clone());
    created
}

#[async_trait]
impl CartApi for InMemoryCartApi {
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Cart, ServiceError> {
        let mut data = self.data.write().await;
        data.begin()?;
        Ok(Cart::with_lines(user_id.clone(), data.carts.get(user_id).cloned().unwrap_or_default()))
    }

    async fn add_line(&self, user_id: &UserId, line: &NewCartLine) -> Result<CartLine, ServiceError> {
        let mut data = self.data.write().await;
        data.begin()?;
        Ok(insert(&mut data, user_id, line.clone()))
    }

    async fn update_quantity(&self, cart_item_id: &CartItemId, quantity: Quantity) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        data.begin()?;
        let (user, index) = data.find_line(cart_item_id).map(|(u, i)| (u.clone(), i)).ok_or_else(|| ServiceError::NotFound(format!("cart item {}", cart_item_id)))?;
        if let Some(line) = data.carts.get_mut(&user).and_then(|lines| lines.get_mut(index)) {
            line.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_line(&self, cart_item_id: &CartItemId) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        data.begin()?;
        let (user, index) = data.find_line(cart_item_id).map(|(u, i)| (u.clone(), i)).ok_or_else(|| ServiceError::NotFound(format!("cart item {}", cart_item_id)))?;
        if let Some(lines) = data.carts.get_mut(&user) {
            lines.remove(index);
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        data.begin()?;
        data.carts.remove(user_id);
        Ok(())
    }
}
