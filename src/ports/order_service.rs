use crate::domain::aggregates::{Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus};
use crate::domain::value_objects::{OrderId, UserId};
use crate::ServiceError;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub address: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderLine>,
}

/// What the service confirms after creating an order.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    /// Lines as the service froze them. Some deployments omit these.
    pub items: Vec<OrderLine>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordPaymentRequest {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
}

/// Order and payment endpoints. The service is the sole authority on
/// order state, including whether a cancellation is allowed.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<CreatedOrder, ServiceError>;

    async fn record_payment(&self, request: RecordPaymentRequest) -> Result<(), ServiceError>;

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, ServiceError>;

    /// Refused with [`ServiceError::Rejected`] unless the order is Pending or PaymentInitiated.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), ServiceError>;

    async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), ServiceError>;
}
