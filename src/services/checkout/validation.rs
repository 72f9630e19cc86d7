//! Shipping input checks run before anything leaves the client

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};
use crate::config::Locale;
use crate::domain::aggregates::Cart;
use crate::session::Session;

/// Per-field validation failures
pub type FieldErrors = ValidationErrors;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingInfo {
    #[validate(custom = "validate_not_blank")]
    pub address: String,
    pub phone: String,
}

/// Shipping details that passed validation, trimmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidShipping {
    pub address: String,
    pub phone: String,
}

impl ShippingInfo {
    pub fn new(address: impl Into<String>, phone: impl Into<String>) -> Self {
        Self { address: address.into(), phone: phone.into() }
    }

    /// Form defaults for a signed-in shopper: the account phone, no address.
    pub fn prefilled(session: &Session) -> Self {
        Self { address: String::new(), phone: session.phone().unwrap_or_default().to_string() }
    }

    pub fn validate_for(&self, locale: &Locale) -> Result<ValidShipping, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        if let Err(e) = validate_phone(&self.phone, locale.phone_digits) {
            errors.add("phone", e);
        }
        if !errors.errors().is_empty() {
            return Err(errors);
        }
        Ok(ValidShipping { address: self.address.trim().to_string(), phone: self.phone.trim().to_string() })
    }
}

/// Everything checked before an order may be created: shipping fields and
/// a non-empty cart.
pub fn validate_submission(shipping: &ShippingInfo, cart: &Cart, locale: &Locale) -> Result<ValidShipping, FieldErrors> {
    let result = shipping.validate_for(locale);
    if !cart.is_empty() {
        return result;
    }
    let mut errors = result.err().unwrap_or_else(ValidationErrors::new);
    errors.add("items", with_message(ValidationError::new("empty"), "cart is empty"));
    Err(errors)
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(with_message(ValidationError::new("required"), "must not be empty"));
    }
    Ok(())
}

fn validate_phone(value: &str, digits: usize) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(with_message(ValidationError::new("required"), "phone number is required"));
    }
    if value.len() != digits || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(with_message(ValidationError::new("length"), format!("must be exactly {} digits", digits)));
    }
    Ok(())
}

fn with_message(mut error: ValidationError, message: impl Into<Cow<'static, str>>) -> ValidationError {
    error.message = Some(message.into());
    error
}

/// A single-field error set.
pub fn field_error(field: &'static str, code: &'static str, message: impl Into<Cow<'static, str>>) -> FieldErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, with_message(ValidationError::new(code), message));
    errors
}
