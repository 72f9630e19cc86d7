//! Checkout coordinator
//!
//! Drives one checkout attempt from validated shipping input to a recorded
//! payment:
//!
//! ```text
//! CollectingInfo -> CreatingOrder -> AwaitingPayment -> ConfirmingPayment -> Completed
//!                        |                 |                    |
//!                        +-----------------+--------------------+--> Failed
//! ```
//!
//! There is no retry, backoff or compensation here. A failed attempt stays
//! `Failed` until [`CheckoutCoordinator::restart`]; an order created before
//! the failure stays on the server as it is (see [`StorefrontError::orphaned_order`]).

pub mod state;
pub mod validation;

use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{ClientConfig, Locale};
use crate::domain::aggregates::{lines_total, Cart, PaymentMethod};
use crate::domain::events::Notification;
use crate::domain::value_objects::{Money, OrderId};
use crate::ports::{CreateOrderRequest, GatewayCallbacks, GatewayOutcome, GatewayRequest, OrderService, PaymentGateway, Prefill, RecordPaymentRequest};
use crate::services::bus::NotificationBus;
use crate::session::Session;
use crate::{Result, StorefrontError};

pub use state::{CheckoutReceipt, CheckoutState, Phase};
pub use validation::{FieldErrors, ShippingInfo, ValidShipping};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutInput {
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
}

pub struct CheckoutCoordinator {
    orders: Arc<dyn OrderService>,
    gateway: Arc<dyn PaymentGateway>,
    bus: NotificationBus,
    locale: Locale,
    merchant_name: String,
    gateway_key: Option<String>,
    state: CheckoutState,
    phase_tx: watch::Sender<Phase>,
}

impl CheckoutCoordinator {
    pub fn new(orders: Arc<dyn OrderService>, gateway: Arc<dyn PaymentGateway>, bus: NotificationBus, config: &ClientConfig) -> Self {
        let (phase_tx, _) = watch::channel(Phase::CollectingInfo);
        Self {
            orders,
            gateway,
            bus,
            locale: config.locale.clone(),
            merchant_name: config.merchant_name.clone(),
            gateway_key: config.gateway_key.clone(),
            state: CheckoutState::default(),
            phase_tx,
        }
    }

    pub fn state(&self) -> &CheckoutState { &self.state }
    pub fn phase(&self) -> Phase { self.state.phase() }

    /// Follows phase changes, e.g. to grey out the submit button.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> { self.phase_tx.subscribe() }

    /// False while an attempt is in flight or finished; the UI must not offer
    /// a second submission then.
    pub fn submit_enabled(&self) -> bool { self.phase().accepts_submission() }

    /// Starts over from `CollectingInfo`. A failure's cause is carried into
    /// the new state as a notice.
    pub fn restart(&mut self) {
        let notice = match std::mem::take(&mut self.state) {
            CheckoutState::Failed { cause, .. } => Some(cause),
            CheckoutState::CollectingInfo { notice, .. } => notice,
            CheckoutState::Completed(_) => None,
            interrupted => {
                warn!(phase = ?interrupted.phase(), "Restarting an interrupted checkout attempt");
                None
            }
        };
        self.state = CheckoutState::CollectingInfo { field_errors: None, notice };
        self.phase_tx.send_replace(Phase::CollectingInfo);
    }

    /// Runs one checkout attempt against `cart` as it is at this instant.
    ///
    /// Validation failures keep the coordinator in `CollectingInfo`; every
    /// other failure leaves it in `Failed`.
    #[instrument(skip_all, fields(user_id = %session.user_id(), method = %input.payment_method))]
    pub async fn submit(&mut self, session: &Session, cart: &Cart, input: CheckoutInput) -> Result<CheckoutReceipt> {
        if !self.phase().accepts_submission() {
            return Err(StorefrontError::InvalidState("a checkout attempt is already in progress or finished"));
        }
        let shipping = match validation::validate_submission(&input.shipping, cart, &self.locale) {
            Ok(shipping) => shipping,
            Err(errors) => {
                debug!(fields = errors.errors().len(), "Checkout input rejected");
                let notice = self.state.notice().cloned();
                self.transition(CheckoutState::CollectingInfo { field_errors: Some(errors.clone()), notice })?;
                return Err(StorefrontError::Validation(errors));
            }
        };
        let method = input.payment_method;

        let snapshot = cart.snapshot();
        self.transition(CheckoutState::CreatingOrder { snapshot: snapshot.clone() })?;
        info!(lines = snapshot.len(), "Creating order");
        let request = CreateOrderRequest {
            user_id: session.user_id().clone(),
            address: shipping.address.clone(),
            phone: shipping.phone.clone(),
            payment_method: method,
            items: snapshot.clone(),
        };
        let created = match self.orders.create_order(request).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail(None, e.into())),
        };

        let lines = if created.items.is_empty() { snapshot } else { created.items };
        let order_id = created.order_id;
        let amount = match lines_total(&lines) {
            Ok(amount) => amount,
            Err(e) => return Err(self.fail(Some(order_id), e.into())),
        };
        info!(%order_id, %amount, "Order created");
        self.transition(CheckoutState::AwaitingPayment { order_id: order_id.clone(), method, amount })?;

        let transaction_id = match method {
            PaymentMethod::CashOnDelivery => format!("COD-{}", Uuid::new_v4()),
            PaymentMethod::OnlineGateway => {
                let outcome = self.collect_online_payment(session, &shipping, &order_id, amount).await;
                match outcome {
                    Ok(transaction_id) => transaction_id,
                    Err(e) => return Err(self.fail(Some(order_id), e)),
                }
            }
        };

        self.transition(CheckoutState::ConfirmingPayment {
            order_id: order_id.clone(),
            method,
            transaction_id: transaction_id.clone(),
            amount,
        })?;
        let status = method.initial_status();
        let record = RecordPaymentRequest { order_id: order_id.clone(), method, transaction_id: transaction_id.clone(), amount, status };
        if let Err(e) = self.orders.record_payment(record).await {
            let cause = match method {
                PaymentMethod::OnlineGateway => StorefrontError::Confirmation {
                    order_id: order_id.clone(),
                    transaction_id: transaction_id.clone(),
                    reason: e.to_string(),
                },
                PaymentMethod::CashOnDelivery => e.into(),
            };
            return Err(self.fail(Some(order_id), cause));
        }

        let receipt = CheckoutReceipt { order_id: order_id.clone(), lines: lines.clone(), amount, method, transaction_id, payment_status: status };
        self.transition(CheckoutState::Completed(receipt.clone()))?;
        info!(%order_id, payment_status = %status, "Checkout completed");

        self.bus.publish(Notification::StockChanged { user_id: session.user_id().clone(), order_id, lines });
        self.bus.publish(Notification::CartChanged { user_id: session.user_id().clone() });
        Ok(receipt)
    }

    async fn collect_online_payment(&self, session: &Session, shipping: &ValidShipping, order_id: &OrderId, amount: Decimal) -> Result<String> {
        let money = Money::new(amount, &self.locale.currency);
        let amount_minor_units = money.to_minor_units()?;
        let request = GatewayRequest {
            amount_minor_units,
            currency: money.currency().to_string(),
            merchant_key: self.gateway_key.clone(),
            order_reference: order_id.clone(),
            merchant_name: self.merchant_name.clone(),
            prefill: Prefill {
                name: session.display_name().map(str::to_string),
                email: session.email().map(str::to_string),
                contact: shipping.phone.clone(),
            },
        };
        let (callbacks, outcome) = GatewayCallbacks::channel();
        debug!(%order_id, amount_minor_units, "Opening payment session");
        self.gateway.open(request, callbacks).await.map_err(|e| StorefrontError::Gateway(e.to_string()))?;

        match outcome.await {
            Ok(GatewayOutcome::Succeeded { transaction_id }) => Ok(transaction_id),
            Ok(GatewayOutcome::Dismissed) | Err(_) => Err(StorefrontError::GatewayDismissed { order_id: order_id.clone() }),
        }
    }

    fn transition(&mut self, next: CheckoutState) -> Result<()> {
        let (from, to) = (self.state.phase(), next.phase());
        if !from.can_advance_to(to) {
            error!(?from, ?to, "Rejected checkout transition");
            return Err(StorefrontError::InvalidState("illegal checkout transition"));
        }
        debug!(?from, ?to, "Checkout transition");
        self.state = next;
        self.phase_tx.send_replace(to);
        Ok(())
    }

    fn fail(&mut self, order_id: Option<OrderId>, cause: StorefrontError) -> StorefrontError {
        let stage = self.state.phase();
        match &cause {
            StorefrontError::GatewayDismissed { order_id } => {
                warn!(%order_id, "Payment session dismissed, order left pending on the server")
            }
            StorefrontError::Confirmation { order_id, transaction_id, reason } => {
                error!(%order_id, %transaction_id, %reason, "Payment taken but not recorded")
            }
            other => warn!(?stage, error = %other, "Checkout attempt failed"),
        }
        debug_assert!(stage.can_advance_to(Phase::Failed));
        self.state = CheckoutState::Failed { stage, order_id, cause: cause.clone() };
        self.phase_tx.send_replace(Phase::Failed);
        cause
    }
}
