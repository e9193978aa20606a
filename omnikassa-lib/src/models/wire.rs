//! Serde helpers for the gateway's loosely typed JSON.
//!
//! Identifiers and amounts arrive either as JSON numbers or as strings
//! depending on the endpoint.

use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;
use std::fmt;

struct StringOrNumber;

impl<'de> Visitor<'de> for StringOrNumber {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

/// Accept `"123"` or `123`, keeping the textual form.
pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(StringOrNumber)
}

/// Minor-unit amounts: written as strings, read from strings or integers.
pub mod amount {
    use super::*;

    pub fn serialize<S: Serializer>(amount: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let text = deserializer.deserialize_any(StringOrNumber)?;
        text.trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid amount '{}'", text)))
    }
}
