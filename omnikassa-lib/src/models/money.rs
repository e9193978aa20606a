//! Monetary amounts in minor units.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::wire;
use crate::canonical::{Canonical, FieldSpec, FieldValue};
use crate::{OmnikassaError, Result};

/// Currency used when none is given.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// An amount in minor units (cents) with its ISO 4217 currency code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "wire::amount")]
    amount: i64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Money {
    /// Create an amount, validating the three-letter currency code.
    pub fn new(amount: i64, currency: impl Into<String>) -> Result<Self> {
        let currency = currency.into();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(OmnikassaError::invalid_input(
                "currency",
                format!("expected a three-letter ISO code, got '{}'", currency),
            ));
        }
        Ok(Self { amount, currency })
    }

    /// An amount in euro cents.
    pub fn eur(amount: i64) -> Self {
        Self {
            amount,
            currency: default_currency(),
        }
    }

    /// Minor units.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// ISO 4217 code.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Signing order: currency, then amount.
    pub fn signature_fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("currency"), FieldSpec::new("amount")]
    }
}

impl Canonical for Money {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "currency" => FieldValue::text(&self.currency),
            "amount" => FieldValue::display(self.amount),
            _ => FieldValue::Absent,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{} {}{}.{:02}", self.currency, sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::serialize;

    #[test]
    fn test_currency_validation() {
        assert!(Money::new(240, "EUR").is_ok());
        assert!(Money::new(240, "eur").is_err());
        assert!(Money::new(240, "EURO").is_err());

        let err = Money::new(240, "eur").unwrap_err();
        assert_eq!(err.code(), crate::OmnikassaErrorCode::InvalidInput);
        assert!(err.to_string().starts_with("invalid currency:"));
    }

    #[test]
    fn test_canonical_order() {
        let money = Money::eur(4999);
        assert_eq!(serialize(&Money::signature_fields(), &money), "EUR,4999");
    }

    #[test]
    fn test_json_shape() {
        let money: Money = serde_json::from_str(r#"{"currency":"EUR","amount":"4999"}"#).unwrap();
        assert_eq!(money.amount(), 4999);
        assert_eq!(
            serde_json::to_value(&money).unwrap(),
            serde_json::json!({ "amount": "4999", "currency": "EUR" })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::eur(4999).to_string(), "EUR 49.99");
        assert_eq!(Money::eur(5).to_string(), "EUR 0.05");
        assert_eq!(Money::eur(-50).to_string(), "EUR -0.50");
        assert_eq!(Money::eur(-150).to_string(), "EUR -1.50");
    }
}
