//! Webhook notification announcing that status results are available.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::wire;
use crate::canonical::{self, Canonical, FieldSpec, FieldValue};
use crate::signature::SignatureService;
use crate::timestamp::WireTimestamp;
use crate::{OmnikassaError, Result};

/// A notification is treated as expired this long before its `expiry`.
pub const EXPIRATION_MARGIN_SECONDS: i64 = 30;

/// Inbound webhook payload. Read-only once parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    authentication: String,
    expiry: WireTimestamp,
    event_name: String,
    #[serde(deserialize_with = "wire::string_or_number")]
    poi_id: String,
    signature: String,
}

impl Notification {
    /// Assemble a notification from its parts.
    ///
    /// Use [`WireTimestamp::parse`] for an expiry taken from a message so the
    /// signed string is preserved.
    pub fn new(
        authentication: impl Into<String>,
        expiry: WireTimestamp,
        event_name: impl Into<String>,
        poi_id: impl ToString,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            authentication: authentication.into(),
            expiry,
            event_name: event_name.into(),
            poi_id: poi_id.to_string(),
            signature: signature.into(),
        }
    }

    /// Parse the webhook JSON body.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Opaque token authorizing the status pull.
    pub fn authentication(&self) -> &str {
        &self.authentication
    }

    /// Parsed expiry.
    pub fn expiry(&self) -> DateTime<FixedOffset> {
        self.expiry.value()
    }

    /// Expiry exactly as received.
    pub fn expiry_raw(&self) -> &str {
        self.expiry.raw()
    }

    /// Event name, e.g. `merchant.order.status.changed`.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Point-of-interaction identifier.
    pub fn poi_id(&self) -> &str {
        &self.poi_id
    }

    /// Hex signature sent with the notification.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Signing order: `authentication, expiry_raw, event_name, poi_id`.
    pub fn signature_fields() -> &'static [FieldSpec] {
        static FIELDS: OnceLock<Vec<FieldSpec>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            vec![
                FieldSpec::new("authentication"),
                FieldSpec::new("expiry_raw"),
                FieldSpec::new("event_name"),
                FieldSpec::new("poi_id"),
            ]
        })
    }

    /// The canonical string the signature covers.
    pub fn canonical_string(&self) -> String {
        canonical::serialize(Self::signature_fields(), self)
    }

    /// Whether the signature verifies under `signer`.
    pub fn valid_signature(&self, signer: &SignatureService) -> bool {
        signer.verify(&self.canonical_string(), &self.signature)
    }

    /// Expiry is at or before `now` plus the safety margin.
    pub fn is_expiring_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.value() <= now + Duration::seconds(EXPIRATION_MARGIN_SECONDS)
    }

    /// [`Self::is_expiring_at`] against the wall clock.
    pub fn is_expiring(&self) -> bool {
        self.is_expiring_at(Utc::now())
    }

    /// Reject an expiring notification, then one with a bad signature.
    pub fn ensure_usable(&self, signer: &SignatureService, now: DateTime<Utc>) -> Result<()> {
        if self.is_expiring_at(now) {
            return Err(OmnikassaError::Freshness {
                expiry: self.expiry_raw().to_string(),
            });
        }
        if !self.valid_signature(signer) {
            return Err(OmnikassaError::authenticity("notification"));
        }
        Ok(())
    }
}

impl Canonical for Notification {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "authentication" => FieldValue::text(&self.authentication),
            "expiry" => FieldValue::Timestamp(self.expiry.value()),
            "expiry_raw" => FieldValue::text(self.expiry.raw()),
            "event_name" => FieldValue::text(&self.event_name),
            "poi_id" => FieldValue::text(&self.poi_id),
            "signature" => FieldValue::text(&self.signature),
            _ => FieldValue::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use crate::OmnikassaErrorCode;

    fn signer() -> SignatureService {
        fixtures::signature_service()
    }

    fn base(expiry: &str, signature: &str) -> Notification {
        Notification::new(
            fixtures::AUTHENTICATION_TOKEN,
            WireTimestamp::parse(expiry).unwrap(),
            fixtures::EVENT_NAME,
            123,
            signature,
        )
    }

    #[test]
    fn test_from_json() {
        let json = fixtures::notification_json(
            fixtures::EXPIRY_3_DIGITS,
            fixtures::NOTIFICATION_SIGNATURE,
        );
        let notification = Notification::from_json(&json.to_string()).unwrap();

        assert_eq!(notification.authentication(), fixtures::AUTHENTICATION_TOKEN);
        assert_eq!(
            notification.expiry(),
            DateTime::parse_from_rfc3339(fixtures::EXPIRY_3_DIGITS).unwrap()
        );
        assert_eq!(notification.event_name(), "merchant.order.status.changed");
        assert_eq!(notification.poi_id(), "123");
        assert_eq!(notification.signature(), fixtures::NOTIFICATION_SIGNATURE);
    }

    #[test]
    fn test_valid_signature() {
        let notification = base(fixtures::EXPIRY_3_DIGITS, fixtures::NOTIFICATION_SIGNATURE);
        assert!(notification.valid_signature(&signer()));
    }

    #[test]
    fn test_invalid_signature() {
        let notification = base(fixtures::EXPIRY_3_DIGITS, "invalidSignature");
        assert!(!notification.valid_signature(&signer()));
    }

    #[test]
    fn test_two_digit_precision_preserved() {
        let json = fixtures::notification_json(
            fixtures::EXPIRY_2_DIGITS,
            fixtures::NOTIFICATION_SIGNATURE_2_DIGITS,
        );
        let notification = Notification::from_json(&json.to_string()).unwrap();

        assert_eq!(notification.expiry_raw(), "2016-11-25T09:53:46.76+01:00");
        assert!(notification.valid_signature(&signer()));
    }

    #[test]
    fn test_locally_built_expiry_uses_millis() {
        let expiry = DateTime::parse_from_rfc3339(fixtures::EXPIRY_3_DIGITS).unwrap();
        let notification = Notification::new(
            fixtures::AUTHENTICATION_TOKEN,
            WireTimestamp::from_datetime(expiry),
            fixtures::EVENT_NAME,
            123,
            fixtures::NOTIFICATION_SIGNATURE,
        );
        assert_eq!(notification.expiry_raw(), fixtures::EXPIRY_3_DIGITS);
        assert!(notification.valid_signature(&signer()));
    }

    #[test]
    fn test_expiring() {
        let now = DateTime::parse_from_rfc3339("2016-11-24T17:30:00.000+00:00")
            .unwrap()
            .with_timezone(&Utc);

        let far = base("2016-11-24T17:45:00.000+00:00", "x");
        assert!(!far.is_expiring_at(now));

        let close = base("2016-11-24T17:30:29.000+00:00", "x");
        assert!(close.is_expiring_at(now));

        let past = base("2016-11-24T17:25:00.000+00:00", "x");
        assert!(past.is_expiring_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = DateTime::parse_from_rfc3339("2016-11-24T17:30:00.000+00:00")
            .unwrap()
            .with_timezone(&Utc);

        let exactly = base("2016-11-24T17:30:30.000+00:00", "x");
        assert!(exactly.is_expiring_at(now));

        let just_after = base("2016-11-24T17:30:30.001+00:00", "x");
        assert!(!just_after.is_expiring_at(now));
    }

    #[test]
    fn test_ensure_usable() {
        let notification = base(fixtures::EXPIRY_3_DIGITS, fixtures::NOTIFICATION_SIGNATURE);
        let before = DateTime::parse_from_rfc3339("2016-11-25T09:00:00+01:00")
            .unwrap()
            .with_timezone(&Utc);
        assert!(notification.ensure_usable(&signer(), before).is_ok());

        let after = before + Duration::hours(1);
        let err = notification.ensure_usable(&signer(), after).unwrap_err();
        assert_eq!(err.code(), OmnikassaErrorCode::Freshness);

        let forged = base(fixtures::EXPIRY_3_DIGITS, "invalidSignature");
        let err = forged.ensure_usable(&signer(), before).unwrap_err();
        assert_eq!(err.code(), OmnikassaErrorCode::Authenticity);
    }
}
