use crate::ports::{GatewayCallbacks, GatewayError, GatewayRequest, PaymentGateway};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// What the scripted shopper does once the payment widget is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayScript {
    /// Pays; the widget reports this transaction id
    Succeed(String),
    /// Closes the widget
    Dismiss,
    /// Walks away; neither handler is ever called
    Abandon,
    /// The widget fails to load
    Unavailable(String),
}

/// Payment widget stand-in. Outcomes are delivered from a spawned task,
/// after `open` has returned, as a hosted widget would.
pub struct ScriptedGateway {
    script: Mutex<GatewayScript>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl ScriptedGateway {
    pub fn new(script: GatewayScript) -> Self {
        Self { script: Mutex::new(script), requests: Mutex::new(vec![]) }
    }

    pub async fn set_script(&self, script: GatewayScript) { *self.script.lock().await = script; }

    /// Every session opened so far.
    pub async fn requests(&self) -> Vec<GatewayRequest> { self.requests.lock().await.clone() }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn open(&self, request: GatewayRequest, callbacks: GatewayCallbacks) -> Result<(), GatewayError> {
        let script = self.script.lock().await.clone();
        if let GatewayScript::Unavailable(reason) = script {
            return Err(GatewayError::Unavailable(reason));
        }
        self.requests.lock().await.push(request);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            match script {
                GatewayScript::Succeed(transaction_id) => callbacks.on_success(transaction_id),
                GatewayScript::Dismiss => callbacks.on_dismiss(),
                GatewayScript::Abandon | GatewayScript::Unavailable(_) => drop(callbacks),
            }
        });
        Ok(())
    }
}
