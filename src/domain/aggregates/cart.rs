//! Cart Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::aggregates::order::OrderLine;
use crate::domain::value_objects::{line_amount, total_amount, CartItemId, ColorId, MoneyError, ProductId, Quantity, SizeId, UserId};

/// A user's mutable pre-checkout selections. The subtotal is always derived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    user_id: UserId,
    lines: Vec<CartLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub color_id: Option<ColorId>,
    pub size_id: Option<SizeId>,
    pub quantity: Quantity,
    /// Price captured when the line was added
    pub unit_price: Decimal,
    pub display: LineDisplay,
}

/// Display snapshot carried with a cart line
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDisplay { pub name: String, pub color: Option<String>, pub image: Option<String> }

/// A selection that has not been assigned a cart item id yet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub color_id: Option<ColorId>,
    pub size_id: Option<SizeId>,
    pub quantity: Quantity,
    pub unit_price: Decimal,
    pub display: LineDisplay,
}

impl CartLine {
    pub fn line_total(&self) -> Result<Decimal, MoneyError> { line_amount(self.unit_price, self.quantity.value()) }

    pub fn same_selection(&self, product_id: &ProductId, color_id: &Option<ColorId>, size_id: &Option<SizeId>) -> bool {
        &self.product_id == product_id && &self.color_id == color_id && &self.size_id == size_id
    }
}

impl Cart {
    pub fn new(user_id: UserId) -> Self { Self { user_id, lines: vec![] } }
    pub fn with_lines(user_id: UserId, lines: Vec<CartLine>) -> Self { Self { user_id, lines } }

    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn line(&self, id: &CartItemId) -> Option<&CartLine> { self.lines.iter().find(|l| &l.cart_item_id == id) }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn subtotal(&self) -> Result<Decimal, MoneyError> { total_amount(self.lines.iter().map(CartLine::line_total)) }

    /// Replaces a line after the server has assigned or confirmed it.
    pub fn replace_line(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|l| l.same_selection(&line.product_id, &line.color_id, &line.size_id)) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    pub fn set_quantity(&mut self, id: &CartItemId, quantity: Quantity) -> Result<(), CartError> {
        let line = self.lines.iter_mut().find(|l| &l.cart_item_id == id).ok_or_else(|| CartError::ItemNotFound(id.clone()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, id: &CartItemId) -> Result<CartLine, CartError> {
        let index = self.lines.iter().position(|l| &l.cart_item_id == id).ok_or_else(|| CartError::ItemNotFound(id.clone()))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) { self.lines.clear(); }

    /// Freezes the current lines into order lines. The result shares nothing
    /// with the cart, so later cart edits cannot reach it.
    pub fn snapshot(&self) -> Vec<OrderLine> { self.lines.iter().map(OrderLine::from_cart_line).collect() }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Cart item {0} not found")]
    ItemNotFound(CartItemId),
}
