//! Timestamps as they travel over the wire.
//!
//! The gateway signs timestamps exactly as it renders them, and its fractional
//! precision varies between two and three digits. [`WireTimestamp`] keeps the
//! received string next to the parsed instant so signatures are always checked
//! against the original text.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{OmnikassaError, Result};

/// Offset form used by the token endpoint (`+0000` without a colon).
const COMPACT_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Parse an ISO-8601 timestamp as sent by the gateway.
///
/// Accepts RFC 3339 (`+01:00`) as well as compact offsets (`+0100`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, COMPACT_OFFSET_FORMAT))
        .map_err(|e| OmnikassaError::Decode(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Render a timestamp with millisecond precision, e.g. `2017-02-06T08:32:51.759+01:00`.
pub fn format_timestamp(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// A timestamp paired with the exact string it was read from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WireTimestamp {
    value: DateTime<FixedOffset>,
    raw: String,
}

impl WireTimestamp {
    /// Parse a timestamp received from the gateway, keeping `raw` verbatim.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let value = parse_timestamp(&raw)?;
        Ok(Self { value, raw })
    }

    /// Wrap a locally produced instant; its raw form is the millisecond rendering.
    pub fn from_datetime(value: DateTime<FixedOffset>) -> Self {
        Self {
            raw: format_timestamp(&value),
            value,
        }
    }

    /// The parsed instant.
    pub fn value(&self) -> DateTime<FixedOffset> {
        self.value
    }

    /// The string as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for WireTimestamp {
    type Error = OmnikassaError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(raw)
    }
}

impl From<WireTimestamp> for String {
    fn from(ts: WireTimestamp) -> Self {
        ts.raw
    }
}

impl fmt::Display for WireTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
