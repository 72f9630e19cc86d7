//! Value Objects for the storefront checkout

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream services send identifiers as either JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

impl From<IdRepr> for String {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Text(s) => s,
            IdRepr::Number(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                IdRepr::deserialize(deserializer).map(|repr| Self(repr.into()))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self { id.0 }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self { Self(value.to_string()) }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self { Self(value) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }
    };
}

string_id!(
    /// Account that owns a cart, orders and payments
    UserId
);
string_id!(CartItemId);
string_id!(ProductId);
string_id!(ColorId);
string_id!(SizeId);
string_id!(OrderId);
string_id!(PaymentId);

/// Money value object, amounts in major currency units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_uppercase() } }
    pub fn currency(&self) -> &str { &self.currency }

    /// Converts to the integer minor-unit amount hosted payment gateways expect
    /// (paise for INR, cents for USD, whole yen for JPY).
    ///
    /// Fails rather than rounds when the amount carries more precision than the
    /// currency's minor unit, or is negative.
    pub fn to_minor_units(&self) -> Result<i64, MoneyError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let exponent = minor_unit_exponent(&self.currency);
        let scaled = self.amount.checked_mul(Decimal::from(10_i64.pow(exponent))).ok_or(MoneyError::Overflow)?;
        if scaled.fract() != Decimal::ZERO {
            return Err(MoneyError::SubMinorPrecision { currency: self.currency.clone() });
        }
        i64::try_from(scaled.trunc()).map_err(|_| MoneyError::Overflow)
    }
}

/// `price × quantity` for one line, without panicking on overflow.
pub fn line_amount(price: Decimal, quantity: u32) -> Result<Decimal, MoneyError> {
    price.checked_mul(Decimal::from(quantity)).ok_or(MoneyError::Overflow)
}

/// Sum of line amounts; overflow is an error, not a panic.
pub fn total_amount<I>(amounts: I) -> Result<Decimal, MoneyError>
where
    I: IntoIterator<Item = Result<Decimal, MoneyError>>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount?).ok_or(MoneyError::Overflow))
}

/// Number of decimal places in a currency's minor unit (ISO 4217).
pub fn minor_unit_exponent(currency: &str) -> u32 {
    match currency.to_ascii_uppercase().as_str() {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" => 0,
        "KWD" | "BHD" | "OMR" | "JOD" | "TND" => 3,
        _ => 2,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError { Negative, SubMinorPrecision { currency: String }, Overflow }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "Negative amount"),
            Self::SubMinorPrecision { currency } => write!(f, "Amount is finer than the {} minor unit", currency),
            Self::Overflow => write!(f, "Amount out of range"),
        }
    }
}

/// Cart line quantity, always at least one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::BelowOne(value)); }
        u32::try_from(value).map(Self).map_err(|_| QuantityError::TooLarge(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { BelowOne(i64), TooLarge(i64) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowOne(v) => write!(f, "Quantity must be at least 1, got {}", v),
            Self::TooLarge(v) => write!(f, "Quantity {} is too large", v),
        }
    }
}
