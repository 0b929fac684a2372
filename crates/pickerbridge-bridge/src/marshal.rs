// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Type marshaling between the scripting runtime and native handlers.
//
// Conversion into native form is driven by the declared `ValueType` of the
// parameter, never by the shape of the incoming value: a `Number(3.0)` is an
// `Int` only when the contract says integer.  Errors carry the dotted field
// path of the offending value so the scripting side can point at it.

use pickerbridge_core::error::{BridgeError, Result};
use pickerbridge_core::{BridgeConfig, DynamicValue, NativeValue, PropertyBag, ValueType};

/// 2^63 as f64. Numbers at or above it overflow i64.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Converts dynamic values to native ones under an explicit expected type.
#[derive(Debug, Clone, Copy)]
pub struct Marshaler {
    max_depth: usize,
}

impl Default for Marshaler {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}

impl Marshaler {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.max_depth)
    }

    /// Convert `value` into native form, expecting `expected`.
    ///
    /// `path` names the value in diagnostics (usually the parameter name).
    pub fn to_native(
        &self,
        value: &DynamicValue,
        expected: ValueType,
        path: &str,
    ) -> Result<NativeValue> {
        self.convert(value, expected, path, 0)
    }

    fn convert(
        &self,
        value: &DynamicValue,
        expected: ValueType,
        path: &str,
        depth: usize,
    ) -> Result<NativeValue> {
        if let DynamicValue::Function { .. } = value {
            return Err(unsupported(path, "function"));
        }
        if depth > self.max_depth {
            return Err(unsupported(
                path,
                &format!("{} nested deeper than {} levels", value.type_name(), self.max_depth),
            ));
        }

        match expected {
            ValueType::Optional(inner) => match value {
                DynamicValue::Undefined => Ok(NativeValue::Absent),
                DynamicValue::Null => Ok(NativeValue::Null),
                other => self.convert(other, *inner, path, depth),
            },
            ValueType::Bool => match value {
                DynamicValue::Bool(b) => Ok(NativeValue::Bool(*b)),
                other => Err(mismatch(path, expected, other.type_name())),
            },
            ValueType::Int => match value {
                DynamicValue::Number(n) => integral(*n)
                    .map(NativeValue::Int)
                    .ok_or_else(|| mismatch(path, expected, &format!("number {n}"))),
                other => Err(mismatch(path, expected, other.type_name())),
            },
            ValueType::Float => match value {
                DynamicValue::Number(n) => Ok(NativeValue::Float(*n)),
                other => Err(mismatch(path, expected, other.type_name())),
            },
            ValueType::String => match value {
                DynamicValue::String(s) => Ok(NativeValue::String(s.clone())),
                other => Err(mismatch(path, expected, other.type_name())),
            },
            ValueType::Properties => match value {
                DynamicValue::Object(map) => self.convert_object(map, path, depth),
                other => Err(mismatch(path, expected, other.type_name())),
            },
            ValueType::Sequence(inner) => match value {
                DynamicValue::Array(items) => self.convert_array(items, *inner, path, depth),
                other => Err(mismatch(path, expected, other.type_name())),
            },
            ValueType::Any => match value {
                DynamicValue::Undefined => Ok(NativeValue::Absent),
                DynamicValue::Null => Ok(NativeValue::Null),
                DynamicValue::Bool(b) => Ok(NativeValue::Bool(*b)),
                DynamicValue::Number(n) => Ok(NativeValue::Float(*n)),
                DynamicValue::String(s) => Ok(NativeValue::String(s.clone())),
                DynamicValue::Array(items) => {
                    self.convert_array(items, ValueType::Any, path, depth)
                }
                DynamicValue::Object(map) => self.convert_object(map, path, depth),
                DynamicValue::Function { .. } => Err(unsupported(path, "function")),
            },
        }
    }

    fn convert_object(
        &self,
        map: &std::collections::BTreeMap<String, DynamicValue>,
        path: &str,
        depth: usize,
    ) -> Result<NativeValue> {
        let mut bag = PropertyBag::new();
        for (key, member) in map {
            let child = format!("{path}.{key}");
            bag.insert(key.clone(), self.convert(member, ValueType::Any, &child, depth + 1)?);
        }
        Ok(NativeValue::Properties(bag))
    }

    fn convert_array(
        &self,
        items: &[DynamicValue],
        inner: ValueType,
        path: &str,
        depth: usize,
    ) -> Result<NativeValue> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.convert(item, inner, &format!("{path}[{i}]"), depth + 1))
            .collect::<Result<Vec<_>>>()
            .map(NativeValue::Sequence)
    }
}

/// Convert a native value back into the scripting runtime's representation.
pub fn to_dynamic(value: &NativeValue) -> DynamicValue {
    match value {
        NativeValue::Absent => DynamicValue::Undefined,
        NativeValue::Null => DynamicValue::Null,
        NativeValue::Bool(b) => DynamicValue::Bool(*b),
        NativeValue::Int(i) => DynamicValue::Number(*i as f64),
        NativeValue::Float(f) => DynamicValue::Number(*f),
        NativeValue::String(s) => DynamicValue::String(s.clone()),
        NativeValue::Sequence(items) => DynamicValue::Array(items.iter().map(to_dynamic).collect()),
        NativeValue::Properties(bag) => DynamicValue::Object(
            bag.iter()
                .map(|(k, v)| (k.clone(), to_dynamic(v)))
                .collect(),
        ),
    }
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= -I64_UPPER && n < I64_UPPER {
        Some(n as i64)
    } else {
        None
    }
}

fn mismatch(path: &str, expected: ValueType, found: &str) -> BridgeError {
    BridgeError::TypeMismatch {
        path: path.to_owned(),
        expected: expected.to_string(),
        found: found.to_owned(),
    }
}

fn unsupported(path: &str, found: &str) -> BridgeError {
    BridgeError::UnsupportedType {
        path: path.to_owned(),
        found: found.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INT: ValueType = ValueType::Int;
    static FLOAT: ValueType = ValueType::Float;
    static STRING: ValueType = ValueType::String;

    fn sample_props() -> DynamicValue {
        DynamicValue::object([
            ("mode", DynamicValue::from("date")),
            ("date", DynamicValue::Number(1_700_000_000_000.0)),
            ("locale", DynamicValue::Null),
            ("title", DynamicValue::Undefined),
            (
                "theme",
                DynamicValue::object([
                    ("dark", DynamicValue::Bool(true)),
                    ("accents", DynamicValue::Array(vec![DynamicValue::from("#fff"), DynamicValue::Number(0.5)])),
                ]),
            ),
        ])
    }

    #[test]
    fn declared_int_accepts_integral_numbers() {
        let m = Marshaler::default();
        assert_eq!(
            m.to_native(&DynamicValue::Number(3.0), ValueType::Int, "count").unwrap(),
            NativeValue::Int(3)
        );
        assert_eq!(
            m.to_native(&DynamicValue::Number(-0.0), ValueType::Int, "count").unwrap(),
            NativeValue::Int(0)
        );
    }

    #[test]
    fn declared_int_rejects_fractions_and_overflow() {
        let m = Marshaler::default();
        for n in [1.5, f64::NAN, f64::INFINITY, 1e19] {
            let err = m.to_native(&DynamicValue::Number(n), ValueType::Int, "count").unwrap_err();
            assert!(matches!(err, BridgeError::TypeMismatch { ref path, .. } if path == "count"));
        }
    }

    #[test]
    fn declared_float_keeps_integral_numbers_as_float() {
        let m = Marshaler::default();
        assert_eq!(
            m.to_native(&DynamicValue::Number(3.0), ValueType::Float, "x").unwrap(),
            NativeValue::Float(3.0)
        );
    }

    #[test]
    fn optional_distinguishes_absent_null_and_zero() {
        let m = Marshaler::default();
        let t = ValueType::Optional(&INT);
        assert_eq!(m.to_native(&DynamicValue::Undefined, t, "n").unwrap(), NativeValue::Absent);
        assert_eq!(m.to_native(&DynamicValue::Null, t, "n").unwrap(), NativeValue::Null);
        assert_eq!(m.to_native(&DynamicValue::Number(0.0), t, "n").unwrap(), NativeValue::Int(0));
    }

    #[test]
    fn non_optional_rejects_undefined() {
        let m = Marshaler::default();
        let err = m.to_native(&DynamicValue::Undefined, ValueType::String, "eventName").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::TypeMismatch { ref found, .. } if found == "undefined"
        ));
    }

    #[test]
    fn typed_sequence_reports_element_path() {
        let m = Marshaler::default();
        let value = DynamicValue::Array(vec![
            DynamicValue::from("a"),
            DynamicValue::from("b"),
            DynamicValue::Number(1.0),
        ]);
        let err = m.to_native(&value, ValueType::Sequence(&STRING), "names").unwrap_err();
        assert!(matches!(err, BridgeError::TypeMismatch { ref path, .. } if path == "names[2]"));
    }

    #[test]
    fn bag_members_are_untyped_numbers_become_float() {
        let m = Marshaler::default();
        let native = m.to_native(&sample_props(), ValueType::Properties, "props").unwrap();
        let bag = native.as_properties().unwrap();
        assert_eq!(bag["date"], NativeValue::Float(1_700_000_000_000.0));
        assert_eq!(bag["locale"], NativeValue::Null);
        assert_eq!(bag["title"], NativeValue::Absent);
    }

    #[test]
    fn function_inside_bag_is_unsupported_with_path() {
        let m = Marshaler::default();
        let value = DynamicValue::object([(
            "handlers",
            DynamicValue::Array(vec![DynamicValue::Null, DynamicValue::Function { id: 4 }]),
        )]);
        let err = m.to_native(&value, ValueType::Properties, "props").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnsupportedType { ref path, ref found } if path == "props.handlers[1]" && found == "function"
        ));
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let m = Marshaler::new(2);
        let deep = DynamicValue::object([(
            "a",
            DynamicValue::object([("b", DynamicValue::object([("c", DynamicValue::Bool(true))]))]),
        )]);
        let err = m.to_native(&deep, ValueType::Properties, "props").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedType { ref path, .. } if path == "props.a.b.c"));

        let shallow = DynamicValue::object([("a", DynamicValue::object([("b", DynamicValue::Null)]))]);
        assert!(m.to_native(&shallow, ValueType::Properties, "props").is_ok());
    }

    #[test]
    fn round_trip_is_lossless_for_supported_values() {
        let m = Marshaler::default();
        let cases: Vec<(DynamicValue, ValueType)> = vec![
            (sample_props(), ValueType::Properties),
            (sample_props(), ValueType::Any),
            (DynamicValue::Number(42.0), ValueType::Int),
            (DynamicValue::Number(0.25), ValueType::Float),
            (DynamicValue::Undefined, ValueType::Optional(&FLOAT)),
            (DynamicValue::Null, ValueType::Optional(&FLOAT)),
            (DynamicValue::from("onConfirm"), ValueType::String),
            (
                DynamicValue::Array(vec![DynamicValue::Number(1.0), DynamicValue::Number(2.0)]),
                ValueType::Sequence(&INT),
            ),
        ];
        for (value, ty) in cases {
            let native = m.to_native(&value, ty, "v").unwrap();
            assert_eq!(to_dynamic(&native), value, "round trip under {ty}");
        }
    }

    mod laws {
        use proptest::collection::{btree_map, vec};
        use proptest::prelude::*;

        use super::*;

        /// Largest magnitude at which every integer is exact in an f64.
        const EXACT_INT: i64 = 1 << 53;

        fn finite_number() -> impl Strategy<Value = f64> {
            any::<f64>().prop_filter("must be finite", |n| n.is_finite())
        }

        /// Function-free values, at most four levels deep.
        fn supported_value() -> impl Strategy<Value = DynamicValue> {
            let leaf = prop_oneof![
                Just(DynamicValue::Undefined),
                Just(DynamicValue::Null),
                any::<bool>().prop_map(DynamicValue::Bool),
                finite_number().prop_map(DynamicValue::Number),
                "[a-zA-Z0-9 ]{0,12}".prop_map(DynamicValue::String),
            ];
            leaf.prop_recursive(4, 64, 6, |inner| {
                prop_oneof![
                    vec(inner.clone(), 0..6).prop_map(DynamicValue::Array),
                    btree_map("[a-zA-Z]{1,8}", inner, 0..6).prop_map(DynamicValue::Object),
                ]
            })
        }

        proptest! {
            #[test]
            fn any_round_trips(value in supported_value()) {
                let native = Marshaler::default().to_native(&value, ValueType::Any, "v").unwrap();
                prop_assert_eq!(to_dynamic(&native), value);
            }

            #[test]
            fn int_round_trips(n in -EXACT_INT..=EXACT_INT) {
                let value = DynamicValue::Number(n as f64);
                let native = Marshaler::default().to_native(&value, ValueType::Int, "count").unwrap();
                prop_assert_eq!(&native, &NativeValue::Int(n));
                prop_assert_eq!(to_dynamic(&native), value);
            }

            #[test]
            fn int_sequence_round_trips(ns in vec(-EXACT_INT..=EXACT_INT, 0..16)) {
                let value = DynamicValue::Array(ns.iter().map(|&n| DynamicValue::Number(n as f64)).collect());
                let native = Marshaler::default().to_native(&value, ValueType::Sequence(&INT), "v").unwrap();
                prop_assert_eq!(to_dynamic(&native), value);
            }
        }
    }
}
