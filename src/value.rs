//! Raw stratum values and their kind discriminants.
//!
//! A [`Value`] is what a stratum actually stores for a field: a primitive,
//! a nested partial object, an ordered array of such objects, or an opaque
//! JSON blob that the engine passes through untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumDiscriminants;

/// Marker key that flags an array element as deleted at its identity.
///
/// A higher-precedence stratum writes `{"id": ..., "__removed": true}` to
/// suppress an element that lower strata still list.
pub const REMOVED_KEY: &str = "__removed";

/// A raw value as written into a stratum.
///
/// The discriminant enum [`ValueKind`] is generated via strum and doubles as
/// the primitive-kind tag inside
/// [`FieldKind::Primitive`](crate::schema::FieldKind::Primitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumDiscriminants, derive_more::From)]
#[strum_discriminants(name(ValueKind))]
#[strum_discriminants(derive(strum::Display, strum::EnumIter, Hash, Serialize, Deserialize))]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// A nested partial object: field name to raw value.
    Object(BTreeMap<String, Value>),
    /// An ordered sequence of elements, normally `Value::Object`s carrying an
    /// identity field.
    Array(Vec<Value>),
    /// Arbitrary JSON carried verbatim; the engine never merges into it.
    Opaque(serde_json::Value),
}

impl Value {
    /// The kind discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        self.into()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// True for an array element object flagged with [`REMOVED_KEY`].
    pub fn is_removal_marker(&self) -> bool {
        matches!(
            self.as_object().and_then(|map| map.get(REMOVED_KEY)),
            Some(Value::Boolean(true))
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl ValueKind {
    /// Whether this kind is one of the four primitive kinds a
    /// `FieldKind::Primitive` may carry.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            ValueKind::String | ValueKind::Number | ValueKind::Boolean | ValueKind::Date
        )
    }

    /// The engine-defined empty value for this kind, used as the final
    /// fallback so resolution stays total.
    pub fn empty_value(self) -> Value {
        match self {
            ValueKind::String => Value::String(String::new()),
            ValueKind::Number => Value::Number(0.0),
            ValueKind::Boolean => Value::Boolean(false),
            ValueKind::Date => Value::Date(DateTime::UNIX_EPOCH),
            ValueKind::Object => Value::Object(BTreeMap::new()),
            ValueKind::Array => Value::Array(Vec::new()),
            ValueKind::Opaque => Value::Opaque(serde_json::Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_discriminant_tracks_variant() {
        assert_eq!(Value::from("hello").kind(), ValueKind::String);
        assert_eq!(Value::from(2.5).kind(), ValueKind::Number);
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
    }

    #[test]
    fn empty_values_match_their_kind() {
        use strum::IntoEnumIterator;
        for kind in ValueKind::iter() {
            assert_eq!(kind.empty_value().kind(), kind);
        }
    }

    #[test]
    fn removal_marker_requires_true_flag() {
        let mut map = BTreeMap::new();
        map.insert(REMOVED_KEY.to_owned(), Value::Boolean(true));
        assert!(Value::Object(map.clone()).is_removal_marker());

        map.insert(REMOVED_KEY.to_owned(), Value::Boolean(false));
        assert!(!Value::Object(map).is_removal_marker());
        assert!(!Value::from("x").is_removal_marker());
    }
}
