//! One order's status as reported by a status pull.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use super::wire;
use crate::canonical::{Canonical, FieldSpec, FieldValue};
use crate::timestamp::WireTimestamp;

/// Order status values reported by the gateway.
///
/// Statuses this crate does not know are kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Completed,
    Cancelled,
    Expired,
    InProgress,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::InProgress => "IN_PROGRESS",
            Self::Other(s) => s,
        }
    }

    /// No further status changes are expected.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            "EXPIRED" => Self::Expired,
            "IN_PROGRESS" => Self::InProgress,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of an [`OrderResultSet`](super::OrderResultSet).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    merchant_order_id: String,
    omnikassa_order_id: String,
    #[serde(deserialize_with = "wire::string_or_number")]
    poi_id: String,
    order_status: OrderStatus,
    order_status_date_time: WireTimestamp,
    #[serde(default)]
    error_code: Option<String>,
    paid_amount: Money,
    total_amount: Money,
}

impl OrderResult {
    /// Merchant's own order reference.
    pub fn merchant_order_id(&self) -> &str {
        &self.merchant_order_id
    }

    /// Gateway order id returned at announce time.
    pub fn omnikassa_order_id(&self) -> &str {
        &self.omnikassa_order_id
    }

    pub fn poi_id(&self) -> &str {
        &self.poi_id
    }

    pub fn order_status(&self) -> &OrderStatus {
        &self.order_status
    }

    /// Parsed status timestamp.
    pub fn order_status_date_time(&self) -> DateTime<FixedOffset> {
        self.order_status_date_time.value()
    }

    /// Status timestamp exactly as received.
    pub fn order_status_date_time_raw(&self) -> &str {
        self.order_status_date_time.raw()
    }

    /// Error code. An empty string is signed as an empty slot, `None` is skipped.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn paid_amount(&self) -> &Money {
        &self.paid_amount
    }

    pub fn total_amount(&self) -> &Money {
        &self.total_amount
    }

    /// Signing order of one result within a result set.
    pub fn signature_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("merchant_order_id"),
            FieldSpec::new("omnikassa_order_id"),
            FieldSpec::new("poi_id"),
            FieldSpec::new("order_status"),
            FieldSpec::new("order_status_date_time_raw"),
            FieldSpec::new("error_code"),
            FieldSpec::nested("paid_amount", Money::signature_fields()),
            FieldSpec::nested("total_amount", Money::signature_fields()),
        ]
    }
}

impl Canonical for OrderResult {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "merchant_order_id" => FieldValue::text(&self.merchant_order_id),
            "omnikassa_order_id" => FieldValue::text(&self.omnikassa_order_id),
            "poi_id" => FieldValue::text(&self.poi_id),
            "order_status" => FieldValue::text(self.order_status.as_str()),
            "order_status_date_time" => FieldValue::Timestamp(self.order_status_date_time.value()),
            "order_status_date_time_raw" => FieldValue::text(self.order_status_date_time.raw()),
            "error_code" => FieldValue::optional_text(self.error_code.as_deref()),
            "paid_amount" => FieldValue::Nested(&self.paid_amount),
            "total_amount" => FieldValue::Nested(&self.total_amount),
            _ => FieldValue::Absent,
        }
    }
}
