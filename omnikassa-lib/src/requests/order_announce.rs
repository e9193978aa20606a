//! Order announcement: the signed order goes out, a signed redirect URL comes back.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::canonical::{Canonical, FieldSpec, FieldValue};
use crate::models::MerchantOrder;
use crate::pipeline::{ApiRequest, AuthorizationMode, ContentType};
use crate::signature::SignatureService;
use crate::timestamp::WireTimestamp;
use crate::transport::HttpMethod;
use crate::{OmnikassaError, Result};

pub const ORDER_ANNOUNCE_PATH: &str = "/order/server/api/order";

/// A merchant order stamped with its request time and signed.
///
/// The timestamp is fixed at construction so the body and its signature
/// always agree.
#[derive(Clone, Debug)]
pub struct OrderAnnounceRequest {
    order: MerchantOrder,
    timestamp: WireTimestamp,
    signature: String,
}

#[derive(Serialize)]
struct AnnounceBody<'a> {
    timestamp: &'a str,
    #[serde(flatten)]
    order: &'a MerchantOrder,
    signature: &'a str,
}

/// Canonical view over the timestamp followed by the order fields.
struct Stamped<'a> {
    timestamp: &'a WireTimestamp,
    order: &'a MerchantOrder,
}

impl Canonical for Stamped<'_> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "timestamp" => FieldValue::text(self.timestamp.raw()),
            other => self.order.field(other),
        }
    }
}

impl OrderAnnounceRequest {
    /// Validate, stamp and sign `order`.
    pub fn new(
        order: MerchantOrder,
        timestamp: DateTime<FixedOffset>,
        signer: &SignatureService,
    ) -> Result<Self> {
        order.validate()?;
        let timestamp = WireTimestamp::from_datetime(timestamp);
        let signature = signer.sign_fields(
            &MerchantOrder::signature_fields(),
            &Stamped {
                timestamp: &timestamp,
                order: &order,
            },
        );
        Ok(Self {
            order,
            timestamp,
            signature,
        })
    }

    pub fn order(&self) -> &MerchantOrder {
        &self.order
    }

    /// Request time as rendered in the body.
    pub fn timestamp(&self) -> &str {
        self.timestamp.raw()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl ApiRequest for OrderAnnounceRequest {
    fn name(&self) -> &'static str {
        "order_announce"
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> String {
        ORDER_ANNOUNCE_PATH.to_string()
    }

    fn authorization(&self) -> AuthorizationMode {
        AuthorizationMode::AccessToken
    }

    fn content_type(&self) -> Option<ContentType> {
        Some(ContentType::Json)
    }

    fn body(&self) -> Result<Option<String>> {
        let body = AnnounceBody {
            timestamp: self.timestamp.raw(),
            order: &self.order,
            signature: &self.signature,
        };
        Ok(Some(serde_json::to_string(&body)?))
    }
}

/// Gateway answer to an announcement.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAnnounceResponse {
    redirect_url: String,
    signature: String,
    #[serde(default)]
    omnikassa_order_id: Option<String>,
}

impl OrderAnnounceResponse {
    /// Hosted payment page to send the consumer to.
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn omnikassa_order_id(&self) -> Option<&str> {
        self.omnikassa_order_id.as_deref()
    }

    pub fn signature_fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("redirect_url")]
    }

    pub fn valid_signature(&self, signer: &SignatureService) -> bool {
        signer.verify_fields(&Self::signature_fields(), self, &self.signature)
    }

    pub fn ensure_authentic(&self, signer: &SignatureService) -> Result<()> {
        if self.valid_signature(signer) {
            Ok(())
        } else {
            Err(OmnikassaError::authenticity("order announce response"))
        }
    }
}

impl Canonical for OrderAnnounceResponse {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "redirect_url" => FieldValue::text(&self.redirect_url),
            "signature" => FieldValue::text(&self.signature),
            "omnikassa_order_id" => FieldValue::optional_text(self.omnikassa_order_id.as_deref()),
            _ => FieldValue::Absent,
        }
    }
}
