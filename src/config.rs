//! Client configuration read from the environment

use std::env;
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_PHONE_DIGITS: usize = 10;
const DEFAULT_MERCHANT_NAME: &str = "Storefront";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid { key: &'static str, expected: &'static str, value: String },
}

/// Currency and phone rules of the storefront's target market
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locale {
    pub currency: String,
    pub phone_digits: usize,
}

impl Default for Locale {
    fn default() -> Self { Self { currency: DEFAULT_CURRENCY.to_string(), phone_digits: DEFAULT_PHONE_DIGITS } }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the cart and order endpoints
    pub api_url: String,
    pub locale: Locale,
    /// Publishable key handed to the hosted payment widget
    pub gateway_key: Option<String>,
    pub merchant_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            locale: Locale::default(),
            gateway_key: None,
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads `.env` if present, then reads `STOREFRONT_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let phone_digits = match lookup("STOREFRONT_PHONE_DIGITS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if (4..=15).contains(&n) => n,
                _ => return Err(ConfigError::Invalid { key: "STOREFRONT_PHONE_DIGITS", expected: "an integer between 4 and 15", value: raw }),
            },
            None => defaults.locale.phone_digits,
        };
        let currency = match lookup("STOREFRONT_CURRENCY") {
            Some(raw) if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_alphabetic()) => raw.to_ascii_uppercase(),
            Some(raw) => return Err(ConfigError::Invalid { key: "STOREFRONT_CURRENCY", expected: "a three-letter ISO 4217 code", value: raw }),
            None => defaults.locale.currency,
        };
        Ok(Self {
            api_url: lookup("STOREFRONT_API_URL").map(|u| u.trim_end_matches('/').to_string()).unwrap_or(defaults.api_url),
            locale: Locale { currency, phone_digits },
            gateway_key: lookup("STOREFRONT_GATEWAY_KEY").filter(|k| !k.is_empty()),
            merchant_name: lookup("STOREFRONT_MERCHANT_NAME").unwrap_or(defaults.merchant_name),
        })
    }
}
