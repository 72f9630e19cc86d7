//! Implementations of the ports
pub mod dto;
pub mod http;
pub mod memory;

pub use http::{HttpCartApi, HttpClient, HttpOrderService};
