//! Wire shapes of the cart and order endpoints
//!
//! Upstream payloads disagree on field names and casing (`cartItemId`,
//! `CartItemId`, `id`, ...). Every variant seen is accepted here and mapped
//! into the canonical domain types, so nothing past this module knows about
//! them. Outgoing requests always use camelCase.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{lines_total, Cart, CartLine, LineDisplay, NewCartLine, Order, OrderLine, OrderStatus, PaymentStatus};
use crate::domain::value_objects::{CartItemId, ColorId, OrderId, ProductId, Quantity, SizeId, UserId};
use crate::ports::{CreateOrderRequest, CreatedOrder, RecordPaymentRequest};
use crate::ServiceError;

// =============================================================================
// Incoming
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RawCartLine {
    #[serde(alias = "cartItemId", alias = "CartItemId", alias = "cart_item_id", alias = "id", alias = "Id")]
    pub cart_item_id: CartItemId,
    #[serde(alias = "productId", alias = "ProductId", alias = "product_id")]
    pub product_id: ProductId,
    #[serde(default, alias = "colorId", alias = "ColorId", alias = "color_id")]
    pub color_id: Option<ColorId>,
    #[serde(default, alias = "sizeId", alias = "SizeId", alias = "size_id")]
    pub size_id: Option<SizeId>,
    #[serde(alias = "Quantity", alias = "qty")]
    pub quantity: i64,
    #[serde(alias = "unitPrice", alias = "UnitPrice", alias = "unit_price", alias = "Price")]
    pub price: Decimal,
    #[serde(default, alias = "productName", alias = "ProductName", alias = "Name")]
    pub name: Option<String>,
    #[serde(default, alias = "colorName", alias = "ColorName", alias = "Color")]
    pub color: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "ImageUrl", alias = "image_url", alias = "Image")]
    pub image: Option<String>,
}

impl RawCartLine {
    pub fn into_line(self) -> Result<CartLine, ServiceError> {
        let quantity = Quantity::new(self.quantity).map_err(|e| decode(format!("cart item {}: {}", self.cart_item_id, e)))?;
        Ok(CartLine {
            cart_item_id: self.cart_item_id,
            product_id: self.product_id,
            color_id: self.color_id,
            size_id: self.size_id,
            quantity,
            unit_price: self.price,
            display: LineDisplay { name: self.name.unwrap_or_default(), color: self.color, image: self.image },
        })
    }
}

/// A cart arrives wrapped in an object or as a bare list of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawCart {
    Wrapped {
        #[serde(alias = "cartItems", alias = "CartItems", alias = "Items", alias = "lines")]
        items: Vec<RawCartLine>,
    },
    Bare(Vec<RawCartLine>),
}

impl RawCart {
    pub fn into_cart(self, user_id: &UserId) -> Result<Cart, ServiceError> {
        let raw = match self { RawCart::Wrapped { items } | RawCart::Bare(items) => items };
        let lines = raw.into_iter().map(RawCartLine::into_line).collect::<Result<Vec<_>, _>>()?;
        Ok(Cart::with_lines(user_id.clone(), lines))
    }
}

#[derive(Debug, Deserialize)]
pub struct RawOrderLine {
    #[serde(alias = "productId", alias = "ProductId")]
    pub product_id: ProductId,
    #[serde(default, alias = "colorId", alias = "ColorId")]
    pub color_id: Option<ColorId>,
    #[serde(default, alias = "sizeId", alias = "SizeId")]
    pub size_id: Option<SizeId>,
    #[serde(alias = "Quantity", alias = "qty")]
    pub quantity: u32,
    #[serde(alias = "Price", alias = "unitPrice", alias = "UnitPrice")]
    pub price: Decimal,
}

impl From<RawOrderLine> for OrderLine {
    fn from(raw: RawOrderLine) -> Self { OrderLine::new(raw.product_id, raw.color_id, raw.size_id, raw.quantity, raw.price) }
}

#[derive(Debug, Deserialize)]
pub struct RawOrder {
    #[serde(alias = "orderId", alias = "OrderId", alias = "order_id", alias = "Id")]
    pub id: OrderId,
    #[serde(default, alias = "userId", alias = "UserId", alias = "user_id")]
    pub user_id: Option<UserId>,
    #[serde(alias = "Status", alias = "orderStatus", alias = "OrderStatus")]
    pub status: String,
    #[serde(default, alias = "Address", alias = "shippingAddress", alias = "ShippingAddress")]
    pub address: String,
    #[serde(default, alias = "Phone", alias = "phoneNumber", alias = "PhoneNumber")]
    pub phone: String,
    #[serde(default, alias = "totalAmount", alias = "TotalAmount", alias = "total_amount", alias = "Total")]
    pub total: Option<Decimal>,
    #[serde(default, alias = "orderDate", alias = "OrderDate", alias = "createdAt", alias = "CreatedAt")]
    pub date: Option<String>,
    #[serde(default, alias = "orderItems", alias = "OrderItems", alias = "Items")]
    pub items: Vec<RawOrderLine>,
    #[serde(default, alias = "paymentStatus", alias = "PaymentStatus")]
    pub payment_status: Option<String>,
}

impl RawOrder {
    /// `owner` fills in the user when the listing omits it.
    pub fn into_order(self, owner: &UserId) -> Result<Order, ServiceError> {
        let status: OrderStatus = self.status.parse().map_err(|e| decode(format!("order {}: {}", self.id, e)))?;
        let payment_status = match self.payment_status.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(s.parse::<PaymentStatus>().map_err(|e| decode(format!("order {}: {}", self.id, e)))?),
            _ => None,
        };
        let lines: Vec<OrderLine> = self.items.into_iter().map(OrderLine::from).collect();
        let order_date = match self.date.as_deref() {
            Some(raw) => parse_timestamp(raw).ok_or_else(|| decode(format!("order {}: bad date '{}'", self.id, raw)))?,
            // Sorts last in newest-first listings
            None => DateTime::<Utc>::UNIX_EPOCH,
        };
        let total_amount = match self.total {
            Some(total) => total,
            None => lines_total(&lines).map_err(|e| decode(format!("order {}: {}", self.id, e)))?,
        };
        Ok(Order {
            order_id: self.id,
            user_id: self.user_id.unwrap_or_else(|| owner.clone()),
            status,
            address: self.address,
            phone: self.phone,
            total_amount,
            order_date,
            lines,
            payment_status,
        })
    }
}

/// Listings arrive as a bare array or wrapped in `orders` / `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawOrderList {
    Wrapped {
        #[serde(alias = "Orders", alias = "data", alias = "Data")]
        orders: Vec<RawOrder>,
    },
    Bare(Vec<RawOrder>),
}

impl RawOrderList {
    pub fn into_orders(self, owner: &UserId) -> Result<Vec<Order>, ServiceError> {
        let raw = match self { RawOrderList::Wrapped { orders } | RawOrderList::Bare(orders) => orders };
        raw.into_iter().map(|o| o.into_order(owner)).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RawCreatedOrder {
    #[serde(alias = "orderId", alias = "OrderId", alias = "order_id", alias = "Id")]
    pub id: OrderId,
    #[serde(default, alias = "orderItems", alias = "OrderItems", alias = "Items")]
    pub items: Vec<RawOrderLine>,
}

impl From<RawCreatedOrder> for CreatedOrder {
    fn from(raw: RawCreatedOrder) -> Self {
        CreatedOrder { order_id: raw.id, items: raw.items.into_iter().map(OrderLine::from).collect() }
    }
}

/// Accepts RFC 3339 and the offset-less `YYYY-MM-DDTHH:MM:SS[.fff]`
/// form, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn decode(message: String) -> ServiceError { ServiceError::Decode(message) }

// =============================================================================
// Outgoing
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNewCartLine<'a> {
    pub product_id: &'a ProductId,
    pub color_id: Option<&'a ColorId>,
    pub size_id: Option<&'a SizeId>,
    pub quantity: u32,
    pub price: Decimal,
}

impl<'a> From<&'a NewCartLine> for WireNewCartLine<'a> {
    fn from(line: &'a NewCartLine) -> Self {
        Self { product_id: &line.product_id, color_id: line.color_id.as_ref(), size_id: line.size_id.as_ref(), quantity: line.quantity.value(), price: line.unit_price }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuantity { pub quantity: u32 }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrderLine<'a> {
    pub product_id: &'a ProductId,
    pub color_id: Option<&'a ColorId>,
    pub size_id: Option<&'a SizeId>,
    pub quantity: u32,
    pub price: Decimal,
}

impl<'a> From<&'a OrderLine> for WireOrderLine<'a> {
    fn from(line: &'a OrderLine) -> Self {
        Self { product_id: line.product_id(), color_id: line.color_id(), size_id: line.size_id(), quantity: line.quantity(), price: line.price() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCreateOrder<'a> {
    pub user_id: &'a UserId,
    pub address: &'a str,
    pub phone: &'a str,
    pub payment_method: &'static str,
    pub items: Vec<WireOrderLine<'a>>,
}

impl<'a> From<&'a CreateOrderRequest> for WireCreateOrder<'a> {
    fn from(r: &'a CreateOrderRequest) -> Self {
        Self {
            user_id: &r.user_id,
            address: &r.address,
            phone: &r.phone,
            payment_method: r.payment_method.as_str(),
            items: r.items.iter().map(WireOrderLine::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayment<'a> {
    pub order_id: &'a OrderId,
    pub payment_method: &'static str,
    pub transaction_id: &'a str,
    pub amount: Decimal,
    pub status: &'static str,
}

impl<'a> From<&'a RecordPaymentRequest> for WirePayment<'a> {
    fn from(r: &'a RecordPaymentRequest) -> Self {
        Self { order_id: &r.order_id, payment_method: r.method.as_str(), transaction_id: &r.transaction_id, amount: r.amount, status: r.status.as_str() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatus { pub status: &'static str }

impl From<OrderStatus> for WireStatus {
    fn from(status: OrderStatus) -> Self { Self { status: status.as_str() } }
}
