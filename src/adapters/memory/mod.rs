//! In-memory implementations of every port, for tests and local demos
mod cart;
mod gateway;
mod orders;

pub use cart::InMemoryCartApi;
pub use gateway::{GatewayScript, ScriptedGateway};
pub use orders::InMemoryOrderService;
