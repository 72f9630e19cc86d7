//! Payment Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::aggregates::order::UnknownStatus;
use crate::domain::value_objects::{OrderId, PaymentId};

/// One attempt to settle an order's total
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    /// Failed attempts do not count against the one-active-payment expectation.
    pub fn is_active(&self) -> bool { self.status != PaymentStatus::Failed }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod { OnlineGateway, CashOnDelivery }

impl PaymentMethod {
    /// Status a freshly recorded payment carries for this method.
    pub fn initial_status(self) -> PaymentStatus {
        match self {
            PaymentMethod::OnlineGateway => PaymentStatus::Paid,
            PaymentMethod::CashOnDelivery => PaymentStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::OnlineGateway => "Online",
            PaymentMethod::CashOnDelivery => "COD",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PaymentMethod {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect();
        match key.as_str() {
            "online" | "onlinegateway" | "gateway" | "card" | "razorpay" => Ok(PaymentMethod::OnlineGateway),
            "cod" | "cashondelivery" | "cash" => Ok(PaymentMethod::CashOnDelivery),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" | "completed" | "success" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}
