//! Canonical serialization used as signing input.
//!
//! The gateway signs a comma separated list of field values taken in a fixed
//! order. A [`FieldSpec`] list describes that order; [`serialize`] walks it over
//! any [`Canonical`] value and produces the exact string the counterpart signed.
//!
//! # Rules
//!
//! - Fields are taken in declaration order. Fields not listed are ignored.
//! - An absent value is dropped entirely, unless the spec sets
//!   `include_if_absent`, in which case an empty string keeps its position.
//! - A nested spec is applied to the field's value recursively. A nested result
//!   that comes out empty (for instance an empty list) drops the field.
//! - A sequence is serialized element by element, joined with the same comma.
//! - Timestamps without a preserved wire form render with millisecond precision.
//!
//! # Example
//!
//! ```
//! use omnikassa_lib::canonical::{serialize, FieldSpec};
//! use serde_json::json;
//!
//! let fields = vec![
//!     FieldSpec::new("currency"),
//!     FieldSpec::new("amount"),
//! ];
//! let money = json!({ "amount": 4999, "currency": "EUR" });
//! assert_eq!(serialize(&fields, &money), "EUR,4999");
//! ```

use chrono::{DateTime, FixedOffset};
use std::borrow::Cow;

use crate::timestamp::format_timestamp;

/// Separator between fields and between sequence elements.
pub const DELIMITER: &str = ",";

/// One entry of a canonical field order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    name: Cow<'static, str>,
    include_if_absent: bool,
    nested: Option<Vec<FieldSpec>>,
}

impl FieldSpec {
    /// A field that is dropped when absent.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            include_if_absent: false,
            nested: None,
        }
    }

    /// A field whose value is itself serialized with `fields`.
    pub fn nested(name: impl Into<Cow<'static, str>>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            include_if_absent: false,
            nested: Some(fields),
        }
    }

    /// Emit an empty string in place of an absent value.
    pub fn include_if_absent(mut self) -> Self {
        self.include_if_absent = true;
        self
    }

    /// Field name looked up on the data.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an absent value keeps its position.
    pub fn includes_if_absent(&self) -> bool {
        self.include_if_absent
    }

    /// Nested field order, if any.
    pub fn nested_fields(&self) -> Option<&[FieldSpec]> {
        self.nested.as_deref()
    }
}

/// Value of a single field as seen by the serializer.
pub enum FieldValue<'a> {
    /// No value; a missing accessor or a null.
    Absent,
    /// Already rendered text.
    Text(Cow<'a, str>),
    /// A locally produced instant, rendered with millisecond precision.
    Timestamp(DateTime<FixedOffset>),
    /// An object or sequence serialized through a nested spec.
    Nested(&'a dyn Canonical),
}

impl<'a> FieldValue<'a> {
    /// Borrowed text.
    pub fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    /// Anything with a locale independent `Display`: integers, booleans.
    pub fn display(value: impl ToString) -> Self {
        Self::Text(Cow::Owned(value.to_string()))
    }

    /// Text when present, absent otherwise.
    pub fn optional_text(value: Option<&'a str>) -> Self {
        value.map_or(Self::Absent, Self::text)
    }

    /// Nested object when present, absent otherwise.
    pub fn optional_nested<T: Canonical>(value: Option<&'a T>) -> Self {
        match value {
            Some(inner) => Self::Nested(inner),
            None => Self::Absent,
        }
    }

    /// Map a JSON value onto a field value.
    pub fn from_json(value: &'a serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::display(b),
            Value::Number(n) => Self::display(n),
            Value::String(s) => Self::text(s),
            Value::Array(_) | Value::Object(_) => Self::Nested(value),
        }
    }
}

/// Data that can be canonicalized by field name.
///
/// Mappings look fields up by key, typed records through a named accessor.
/// Unknown names must yield [`FieldValue::Absent`], never an error.
pub trait Canonical {
    /// Look up the value of `name`.
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// The elements when this value is a sequence.
    fn elements(&self) -> Option<Vec<&dyn Canonical>> {
        None
    }
}

impl<T: Canonical> Canonical for [T] {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }

    fn elements(&self) -> Option<Vec<&dyn Canonical>> {
        Some(self.iter().map(|item| item as &dyn Canonical).collect())
    }
}

impl<T: Canonical> Canonical for Vec<T> {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }

    fn elements(&self) -> Option<Vec<&dyn Canonical>> {
        self.as_slice().elements()
    }
}

impl Canonical for serde_json::Value {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match self {
            serde_json::Value::Object(map) => {
                map.get(name).map_or(FieldValue::Absent, FieldValue::from_json)
            }
            _ => FieldValue::Absent,
        }
    }

    fn elements(&self) -> Option<Vec<&dyn Canonical>> {
        match self {
            serde_json::Value::Array(items) => {
                Some(items.iter().map(|item| item as &dyn Canonical).collect())
            }
            _ => None,
        }
    }
}

/// Serialize `data` according to `fields`.
///
/// A sequence is serialized element by element and the results are joined with
/// [`DELIMITER`].
pub fn serialize(fields: &[FieldSpec], data: &dyn Canonical) -> String {
    match data.elements() {
        Some(items) => items
            .into_iter()
            .map(|item| serialize_object(fields, item))
            .collect::<Vec<_>>()
            .join(DELIMITER),
        None => serialize_object(fields, data),
    }
}

fn serialize_object(fields: &[FieldSpec], object: &dyn Canonical) -> String {
    fields
        .iter()
        .filter_map(|spec| extract_field(spec, object))
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

fn extract_field(spec: &FieldSpec, object: &dyn Canonical) -> Option<String> {
    let value = object.field(spec.name());

    if let FieldValue::Absent = value {
        return spec.include_if_absent.then(String::new);
    }

    match (value, spec.nested_fields()) {
        (FieldValue::Nested(inner), Some(nested)) => {
            let result = serialize(nested, inner);
            (!result.is_empty()).then_some(result)
        }
        // A nested spec over a scalar selects nothing.
        (_, Some(_)) => None,
        (FieldValue::Text(text), None) => Some(text.into_owned()),
        (FieldValue::Timestamp(ts), None) => Some(format_timestamp(&ts)),
        // Structured value without a spec to flatten it.
        (FieldValue::Nested(_), None) | (FieldValue::Absent, None) => {
            spec.include_if_absent.then(String::new)
        }
    }
}

/// A reusable field order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalSerializer {
    fields: Vec<FieldSpec>,
}

impl CanonicalSerializer {
    /// Create a serializer for the given field order.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The configured field order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Serialize one object or a sequence of objects.
    pub fn serialize(&self, data: &dyn Canonical) -> String {
        serialize(&self.fields, data)
    }
}
