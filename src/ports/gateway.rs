use crate::domain::value_objects::OrderId;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

/// Contact details the hosted widget shows pre-filled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefill {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayRequest {
    /// Integer amount in the currency's minor unit
    pub amount_minor_units: i64,
    pub currency: String,
    /// Publishable key identifying the merchant to the widget
    pub merchant_key: Option<String>,
    pub order_reference: OrderId,
    pub merchant_name: String,
    pub prefill: Prefill,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayOutcome {
    Succeeded { transaction_id: String },
    Dismissed,
}

/// The success and dismiss handlers of one payment session.
///
/// Both consume the handle, so a session reports at most one outcome.
/// Dropping the handle without calling either counts as a dismissal.
#[derive(Debug)]
pub struct GatewayCallbacks {
    tx: oneshot::Sender<GatewayOutcome>,
}

impl GatewayCallbacks {
    pub fn channel() -> (Self, oneshot::Receiver<GatewayOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn on_success(self, transaction_id: impl Into<String>) {
        let _ = self.tx.send(GatewayOutcome::Succeeded { transaction_id: transaction_id.into() });
    }

    pub fn on_dismiss(self) {
        let _ = self.tx.send(GatewayOutcome::Dismissed);
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway session could not be opened: {0}")]
    Unavailable(String),
}

/// A third-party hosted payment widget.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment session. Returns once the session is showing; the
    /// outcome arrives later through `callbacks`.
    async fn open(&self, request: GatewayRequest, callbacks: GatewayCallbacks) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dropped_callbacks_close_the_channel() {
        let (callbacks, rx) = GatewayCallbacks::channel();
        drop(callbacks);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_success_reaches_receiver() {
        let (callbacks, rx) = GatewayCallbacks::channel();
        callbacks.on_success("pay_123");
        assert_eq!(rx.await.unwrap(), GatewayOutcome::Succeeded { transaction_id: "pay_123".into() });
    }
}
