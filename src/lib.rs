//! Storefront checkout
//!
//! Client-side orchestration that turns a shopper's mutable cart into an
//! immutable, paid order record.
//!
//! ## Features
//! - Cart repository with optimistic updates and server reconciliation
//! - Checkout state machine for hosted online payment and cash on delivery
//! - Typed order service contract with upstream payload normalization
//! - In-process notification bus for cross-view refresh hints
//! - Order history view model with server-authoritative cancellation

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod session;

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::value_objects::{MoneyError, OrderId, QuantityError};

pub use config::{ClientConfig, Locale};
pub use domain::aggregates::{Cart, CartLine, NewCartLine, Order, OrderLine, OrderStatus, Payment, PaymentMethod, PaymentStatus};
pub use domain::events::{Notification, Topic};
pub use services::{CartRepository, CheckoutCoordinator, NotificationBus, OrderHistoryView};
pub use session::Session;

// =============================================================================
// Error Types
// =============================================================================

/// Failures reported by the external cart and order services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rejected by validation: {0}")]
    Validation(String),

    #[error("Request refused: {0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unreadable response: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorefrontError {
    /// Client-detectable input problems; never reaches the network
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request refused: {0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The shopper closed the hosted payment session. The order stays Pending.
    #[error("payment cancelled")]
    GatewayDismissed { order_id: OrderId },

    #[error("Payment gateway unavailable: {0}")]
    Gateway(String),

    /// The gateway took the payment but the payment record was not written.
    #[error("Payment {transaction_id} for order {order_id} succeeded but was not recorded: {reason}")]
    Confirmation { order_id: OrderId, transaction_id: String, reason: String },

    #[error("Checkout is not accepting input: {0}")]
    InvalidState(&'static str),

    #[error("Amount error: {0}")]
    Money(#[from] MoneyError),
}

/// How loudly a failure must be surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escalation {
    /// Shown next to the offending form field
    Inline,
    /// Routine message; the shopper may resubmit
    Retry,
    /// Informational, dismissible
    Notice,
    /// Must stay on screen until acknowledged
    PersistentBanner,
}

impl StorefrontError {
    pub fn escalation(&self) -> Escalation {
        match self {
            Self::Validation(_) | Self::InvalidState(_) => Escalation::Inline,
            Self::Network(_) | Self::Rejected(_) | Self::NotFound(_) | Self::Gateway(_) | Self::Money(_) => Escalation::Retry,
            Self::GatewayDismissed { .. } => Escalation::Notice,
            Self::Confirmation { .. } => Escalation::PersistentBanner,
        }
    }

    /// Order left behind on the server by a failed checkout, if any.
    pub fn orphaned_order(&self) -> Option<&OrderId> {
        match self {
            Self::GatewayDismissed { order_id } | Self::Confirmation { order_id, .. } => Some(order_id),
            _ => None,
        }
    }
}

impl From<ServiceError> for StorefrontError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Network(m) => Self::Network(m),
            ServiceError::Decode(m) => Self::Network(format!("unreadable response: {}", m)),
            ServiceError::Validation(m) | ServiceError::Rejected(m) => Self::Rejected(m),
            ServiceError::NotFound(m) => Self::NotFound(m),
        }
    }
}

impl From<QuantityError> for StorefrontError {
    fn from(e: QuantityError) -> Self {
        Self::Validation(services::checkout::validation::field_error("quantity", "range", e.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
