//! Contracts of the external collaborators
mod cart_api;
mod gateway;
mod order_service;

pub use cart_api::CartApi;
pub use gateway::{GatewayCallbacks, GatewayError, GatewayOutcome, GatewayRequest, PaymentGateway, Prefill};
pub use order_service::{CreateOrderRequest, CreatedOrder, OrderService, RecordPaymentRequest};
