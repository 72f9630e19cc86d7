//! Checkout states and the transitions between them

use rust_decimal::Decimal;
use crate::domain::aggregates::{OrderLine, PaymentMethod, PaymentStatus};
use crate::domain::value_objects::OrderId;
use crate::services::checkout::validation::FieldErrors;
use crate::StorefrontError;

/// Exactly one is active at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutState {
    CollectingInfo {
        field_errors: Option<FieldErrors>,
        /// Outcome of the previous attempt, shown when the shopper starts over
        notice: Option<StorefrontError>,
    },
    CreatingOrder { snapshot: Vec<OrderLine> },
    AwaitingPayment { order_id: OrderId, method: PaymentMethod, amount: Decimal },
    ConfirmingPayment { order_id: OrderId, method: PaymentMethod, transaction_id: String, amount: Decimal },
    Completed(CheckoutReceipt),
    Failed { stage: Phase, order_id: Option<OrderId>, cause: StorefrontError },
}

impl Default for CheckoutState {
    fn default() -> Self { CheckoutState::CollectingInfo { field_errors: None, notice: None } }
}

/// Result of a finished checkout
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub payment_status: PaymentStatus,
}

/// Payload-free view of [`CheckoutState`], for watchers and transition checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    CollectingInfo,
    CreatingOrder,
    AwaitingPayment,
    ConfirmingPayment,
    Completed,
    Failed,
}

impl Phase {
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (CollectingInfo, CollectingInfo) | (CollectingInfo, CreatingOrder)
                | (CreatingOrder, AwaitingPayment) | (CreatingOrder, Failed)
                | (AwaitingPayment, ConfirmingPayment) | (AwaitingPayment, Failed)
                | (ConfirmingPayment, Completed) | (ConfirmingPayment, Failed)
        )
    }

    /// Submission is only accepted while collecting input.
    pub fn accepts_submission(self) -> bool { self == Phase::CollectingInfo }
}

impl CheckoutState {
    pub fn phase(&self) -> Phase {
        match self {
            CheckoutState::CollectingInfo { .. } => Phase::CollectingInfo,
            CheckoutState::CreatingOrder { .. } => Phase::CreatingOrder,
            CheckoutState::AwaitingPayment { .. } => Phase::AwaitingPayment,
            CheckoutState::ConfirmingPayment { .. } => Phase::ConfirmingPayment,
            CheckoutState::Completed(_) => Phase::Completed,
            CheckoutState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CheckoutState::CollectingInfo { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&StorefrontError> {
        match self {
            CheckoutState::CollectingInfo { notice, .. } => notice.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_reachable_only_from_network_stages() {
        assert!(Phase::CreatingOrder.can_advance_to(Phase::Failed));
        assert!(Phase::AwaitingPayment.can_advance_to(Phase::Failed));
        assert!(Phase::ConfirmingPayment.can_advance_to(Phase::Failed));
        assert!(!Phase::CollectingInfo.can_advance_to(Phase::Failed));
    }

    #[test]
    fn test_no_skipping_stages() {
        assert!(!Phase::CollectingInfo.can_advance_to(Phase::ConfirmingPayment));
        assert!(!Phase::CreatingOrder.can_advance_to(Phase::Completed));
        assert!(!Phase::Completed.can_advance_to(Phase::CreatingOrder));
        assert!(!Phase::Failed.can_advance_to(Phase::CreatingOrder));
    }

    #[test]
    fn test_only_collecting_accepts_submission() {
        for phase in [Phase::CreatingOrder, Phase::AwaitingPayment, Phase::ConfirmingPayment, Phase::Completed, Phase::Failed] {
            assert!(!phase.accepts_submission());
        }
        assert!(Phase::CollectingInfo.accepts_submission());
    }
}
