use crate::domain::aggregates::{lines_total, Order, OrderStatus, Payment, PaymentStatus};
use crate::domain::value_objects::{OrderId, PaymentId, UserId};
use crate::ports::{CreateOrderRequest, CreatedOrder, OrderService, RecordPaymentRequest};
use crate::ServiceError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct OrderData {
    orders: Vec<Order>,
    payments: Vec<Payment>,
    sequence_counter: u64,
    payment_counter: u64,
    create_calls: usize,
    record_calls: usize,
    fail_create: Option<ServiceError>,
    fail_record: Option<ServiceError>,
}

impl OrderData {
    fn order_mut(&mut self, id: &OrderId) -> Result<&mut Order, ServiceError> {
        self.orders.iter_mut().find(|o| &o.order_id == id).ok_or_else(|| ServiceError::NotFound(format!("order {}", id)))
    }
}

/// In-memory order service that applies the same rules the real service
/// does: totals fixed at creation, payments only for existing orders,
/// cancellation only while Pending or PaymentInitiated.
#[derive(Default)]
pub struct InMemoryOrderService {
    data: RwLock<OrderData>,
}

impl InMemoryOrderService {
    pub fn new() -> Self { Self::default() }

    pub async fn fail_next_create(&self, error: ServiceError) { self.data.write().await.fail_create = Some(error); }
    pub async fn fail_next_record_payment(&self, error: ServiceError) { self.data.write().await.fail_record = Some(error); }

    pub async fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.data.read().await.orders.iter().find(|o| &o.order_id == order_id).cloned()
    }

    pub async fn orders(&self) -> Vec<Order> { self.data.read().await.orders.clone() }

    pub async fn payments_for_order(&self, order_id: &OrderId) -> Vec<Payment> {
        self.data.read().await.payments.iter().filter(|p| &p.order_id == order_id).cloned().collect()
    }

    pub async fn create_calls(&self) -> usize { self.data.read().await.create_calls }
    pub async fn record_calls(&self) -> usize { self.data.read().await.record_calls }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<CreatedOrder, ServiceError> {
        let mut data = self.data.write().await;
        data.create_calls += 1;
        if let Some(e) = data.fail_create.take() {
            return Err(e);
        }
        if request.items.is_empty() {
            return Err(ServiceError::Validation("order has no items".into()));
        }
        if request.address.trim().is_empty() || request.phone.trim().is_empty() {
            return Err(ServiceError::Validation("address and phone are required".into()));
        }

        let total_amount = lines_total(&request.items).map_err(|e| ServiceError::Validation(e.to_string()))?;

        data.sequence_counter += 1;
        let order = Order {
            order_id: OrderId::new(data.sequence_counter.to_string()),
            user_id: request.user_id,
            status: OrderStatus::Pending,
            address: request.address,
            phone: request.phone,
            total_amount,
            order_date: Utc::now(),
            lines: request.items,
            payment_status: None,
        };
        let created = CreatedOrder { order_id: order.order_id.clone(), items: order.lines.clone() };
        data.orders.push(order);
        Ok(created)
    }

    async fn record_payment(&self, request: RecordPaymentRequest) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        data.record_calls += 1;
        if let Some(e) = data.fail_record.take() {
            return Err(e);
        }
        let order = data.order_mut(&request.order_id)?;
        if order.total_amount != request.amount {
            return Err(ServiceError::Validation(format!("amount {} does not match order total {}", request.amount, order.total_amount)));
        }
        if request.status == PaymentStatus::Paid && order.status.can_transition_to(OrderStatus::Processing) {
            order.status = OrderStatus::Processing;
        }

        data.payment_counter += 1;
        let payment = Payment {
            payment_id: PaymentId::new(data.payment_counter.to_string()),
            order_id: request.order_id,
            method: request.method,
            transaction_id: request.transaction_id,
            amount: request.amount,
            status: request.status,
            payment_date: Utc::now(),
        };
        data.payments.push(payment);
        Ok(())
    }

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, ServiceError> {
        let data = self.data.read().await;
        Ok(data
            .orders
            .iter()
            .filter(|o| &o.user_id == user_id)
            .map(|o| {
                let mut order = o.clone();
                order.payment_status = data.payments.iter().rev().find(|p| p.order_id == o.order_id && p.is_active()).map(|p| p.status);
                order
            })
            .collect())
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        let order = data.order_mut(order_id)?;
        if !order.status.is_cancellable() {
            return Err(ServiceError::Rejected(format!("order {} is {} and can no longer be cancelled", order_id, order.status)));
        }
        order.status = OrderStatus::Cancelled;
        Ok(())
    }

    async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        let order = data.order_mut(order_id)?;
        if order.status.is_terminal() {
            return Err(ServiceError::Rejected(format!("order {} is {} and can no longer change", order_id, order.status)));
        }
        if !order.status.can_transition_to(status) {
            return Err(ServiceError::Rejected(format!("order {} cannot move from {} to {}", order_id, order.status, status)));
        }
        order.status = status;
        Ok(())
    }
}
