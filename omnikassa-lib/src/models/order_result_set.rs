//! Signed page of order results returned by a status pull.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::order_result::OrderResult;
use crate::canonical::{self, Canonical, FieldSpec, FieldValue};
use crate::signature::SignatureService;
use crate::{OmnikassaError, Result};

/// One page of status results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResultSet {
    #[serde(rename = "moreOrderResultsAvailable")]
    more_available: bool,
    #[serde(default)]
    order_results: Vec<OrderResult>,
    signature: String,
}

impl OrderResultSet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Another page is waiting behind this one.
    pub fn more_available(&self) -> bool {
        self.more_available
    }

    pub fn order_results(&self) -> &[OrderResult] {
        &self.order_results
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Consume the page, keeping only its results.
    pub fn into_order_results(self) -> Vec<OrderResult> {
        self.order_results
    }

    /// Signing order: the continuation flag, then every result in sequence.
    pub fn signature_fields() -> &'static [FieldSpec] {
        static FIELDS: OnceLock<Vec<FieldSpec>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            vec![
                FieldSpec::new("more_order_results_available"),
                FieldSpec::nested("order_results", OrderResult::signature_fields()),
            ]
        })
    }

    pub fn canonical_string(&self) -> String {
        canonical::serialize(Self::signature_fields(), self)
    }

    pub fn valid_signature(&self, signer: &SignatureService) -> bool {
        signer.verify(&self.canonical_string(), &self.signature)
    }

    /// Fail with an authenticity error unless the signature verifies.
    pub fn ensure_authentic(&self, signer: &SignatureService) -> Result<()> {
        if self.valid_signature(signer) {
            Ok(())
        } else {
            Err(OmnikassaError::authenticity("order result set"))
        }
    }
}

impl Canonical for OrderResultSet {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "more_order_results_available" => FieldValue::display(self.more_available),
            "order_results" => FieldValue::Nested(&self.order_results),
            "signature" => FieldValue::text(&self.signature),
            _ => FieldValue::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    fn page(timestamp: &str, signature: &str) -> OrderResultSet {
        let json = fixtures::order_result_set_json(false, vec![fixtures::order_result_json(timestamp)], signature);
        OrderResultSet::from_json(&json.to_string()).unwrap()
    }

    #[test]
    fn test_canonical_string() {
        let set = page(fixtures::ORDER_STATUS_TIME_3_DIGITS, fixtures::ORDER_RESULT_SET_SIGNATURE);
        assert_eq!(set.canonical_string(), fixtures::ORDER_RESULT_SET_CANONICAL);
    }

    #[test]
    fn test_valid_signature() {
        let set = page(fixtures::ORDER_STATUS_TIME_3_DIGITS, fixtures::ORDER_RESULT_SET_SIGNATURE);
        assert!(set.valid_signature(&fixtures::signature_service()));
        assert!(set.ensure_authentic(&fixtures::signature_service()).is_ok());
    }

    #[test]
    fn test_invalid_signature() {
        let set = page(fixtures::ORDER_STATUS_TIME_3_DIGITS, "invalidSignature");
        assert!(!set.valid_signature(&fixtures::signature_service()));
        let err = set.ensure_authentic(&fixtures::signature_service()).unwrap_err();
        assert_eq!(err.code(), crate::OmnikassaErrorCode::Authenticity);
    }

    #[test]
    fn test_two_digit_timestamp_preserved() {
        let set = page(
            fixtures::ORDER_STATUS_TIME_2_DIGITS,
            fixtures::ORDER_RESULT_SET_SIGNATURE_2_DIGITS,
        );
        assert_eq!(
            set.order_results()[0].order_status_date_time_raw(),
            "2016-11-25T13:20:03.15+01:00"
        );
        assert!(set.valid_signature(&fixtures::signature_service()));
    }

    #[test]
    fn test_tampered_result_fails() {
        let json = fixtures::order_result_set_json(
            false,
            vec![fixtures::order_result_json(fixtures::ORDER_STATUS_TIME_3_DIGITS)],
            fixtures::ORDER_RESULT_SET_SIGNATURE,
        );
        let mut json = json;
        json["orderResults"][0]["orderStatus"] = "COMPLETED".into();
        let set: OrderResultSet = serde_json::from_value(json).unwrap();
        assert!(!set.valid_signature(&fixtures::signature_service()));
    }

    #[test]
    fn test_empty_page() {
        let signer = fixtures::signature_service();
        let json = fixtures::signed_page(&signer, false, vec![]);
        let set: OrderResultSet = serde_json::from_value(json).unwrap();
        assert_eq!(set.canonical_string(), "false");
        assert!(set.valid_signature(&signer));
        assert!(set.into_order_results().is_empty());
    }
}
