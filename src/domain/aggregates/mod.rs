//! Aggregates module
pub mod cart;
pub mod order;
pub mod payment;

pub use cart::{Cart, CartError, CartLine, LineDisplay, NewCartLine};
pub use order::{lines_total, Order, OrderLine, OrderStatus, UnknownStatus};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
