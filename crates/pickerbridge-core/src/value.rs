// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Value models on either side of the bridge.
//
// `DynamicValue` is what the scripting runtime hands us: one numeric type,
// `undefined` distinct from `null`, callbacks as opaque handles.  `NativeValue`
// is what native handlers consume: integers and floats kept apart, absence
// modelled explicitly.  `ValueType` is the static tag that decides how one
// becomes the other.

use std::collections::BTreeMap;
use std::fmt;

/// Structured property bag passed to native handlers.
pub type PropertyBag = BTreeMap<String, NativeValue>;

/// A value as seen by the scripting runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Undefined,
    Null,
    Bool(bool),
    /// The runtime's single numeric type.
    Number(f64),
    String(String),
    Array(Vec<DynamicValue>),
    Object(BTreeMap<String, DynamicValue>),
    /// Callback handle owned by the scripting runtime. Never marshalable.
    Function { id: u32 },
}

impl DynamicValue {
    /// Name of the variant as the scripting side would report it.
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::Undefined => "undefined",
            DynamicValue::Null => "null",
            DynamicValue::Bool(_) => "boolean",
            DynamicValue::Number(_) => "number",
            DynamicValue::String(_) => "string",
            DynamicValue::Array(_) => "array",
            DynamicValue::Object(_) => "object",
            DynamicValue::Function { .. } => "function",
        }
    }

    /// Convenience constructor for object literals in tests and hosts.
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, DynamicValue)>,
        K: Into<String>,
    {
        DynamicValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Lossy projection to JSON for logging and demo output.
    ///
    /// `undefined`, functions and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            DynamicValue::Undefined | DynamicValue::Null | DynamicValue::Function { .. } => {
                Value::Null
            }
            DynamicValue::Bool(b) => Value::Bool(*b),
            DynamicValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DynamicValue::String(s) => Value::String(s.clone()),
            DynamicValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            DynamicValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => DynamicValue::Null,
            Value::Bool(b) => DynamicValue::Bool(b),
            // Every JSON number fits the runtime's f64 (possibly rounded).
            Value::Number(n) => DynamicValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => DynamicValue::String(s),
            Value::Array(items) => DynamicValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                DynamicValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_owned())
    }
}

impl From<f64> for DynamicValue {
    fn from(n: f64) -> Self {
        DynamicValue::Number(n)
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}

/// A value as consumed by native handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Optional parameter with no value (distinct from `Null` and zero).
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<NativeValue>),
    Properties(PropertyBag),
}

impl NativeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of either integer or float storage.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Int(i) => Some(*i as f64),
            NativeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_properties(&self) -> Option<&PropertyBag> {
        match self {
            NativeValue::Properties(bag) => Some(bag),
            _ => None,
        }
    }

    /// `true` for `Absent` and `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, NativeValue::Absent | NativeValue::Null)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_owned())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Int(i)
    }
}

impl From<PropertyBag> for NativeValue {
    fn from(bag: PropertyBag) -> Self {
        NativeValue::Properties(bag)
    }
}

/// Static expected-type tag for one parameter (or one nested position).
///
/// Nested tags are `&'static` so operation tables can live in statics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    /// Integral number within the i64 range.
    Int,
    /// Any number.
    Float,
    String,
    /// Property bag whose members are marshaled as `Any`.
    Properties,
    /// Whatever the dynamic value is, within the supported subset.
    Any,
    /// `undefined` becomes `Absent`, `null` stays `Null`, else the inner type.
    Optional(&'static ValueType),
    Sequence(&'static ValueType),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Int => write!(f, "integer"),
            ValueType::Float => write!(f, "number"),
            ValueType::String => write!(f, "string"),
            ValueType::Properties => write!(f, "object"),
            ValueType::Any => write!(f, "any value"),
            ValueType::Optional(inner) => write!(f, "optional {inner}"),
            ValueType::Sequence(inner) => write!(f, "array of {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_objects_become_dynamic_objects() {
        let value = DynamicValue::from(json!({ "mode": "date", "minuteInterval": 5, "nested": [true, null] }));
        let DynamicValue::Object(map) = value else {
            panic!("expected object");
        };
        assert_eq!(map["mode"], DynamicValue::String("date".into()));
        assert_eq!(map["minuteInterval"], DynamicValue::Number(5.0));
        assert_eq!(
            map["nested"],
            DynamicValue::Array(vec![DynamicValue::Bool(true), DynamicValue::Null])
        );
    }

    #[test]
    fn to_json_drops_unrepresentable_values() {
        let value = DynamicValue::object([
            ("callback", DynamicValue::Function { id: 7 }),
            ("missing", DynamicValue::Undefined),
            ("ratio", DynamicValue::Number(f64::INFINITY)),
            ("title", DynamicValue::from("Pick a date")),
        ]);
        assert_eq!(
            value.to_json(),
            json!({ "callback": null, "missing": null, "ratio": null, "title": "Pick a date" })
        );
    }

    #[test]
    fn value_type_display_nests() {
        static INT: ValueType = ValueType::Int;
        static SEQ: ValueType = ValueType::Sequence(&INT);
        assert_eq!(ValueType::Optional(&SEQ).to_string(), "optional array of integer");
    }

    #[test]
    fn numeric_views() {
        assert_eq!(NativeValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(NativeValue::Float(2.5).as_i64(), None);
        assert!(NativeValue::Absent.is_nullish());
        assert!(!NativeValue::Int(0).is_nullish());
    }
}
