//! Client-side services wired from the ports
pub mod bus;
pub mod cart_repository;
pub mod checkout;
pub mod order_history;

pub use bus::{NotificationBus, Subscription};
pub use cart_repository::CartRepository;
pub use checkout::{CheckoutCoordinator, CheckoutInput, CheckoutReceipt, CheckoutState, Phase, ShippingInfo};
pub use order_history::OrderHistoryView;
