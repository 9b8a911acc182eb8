// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Validate a value against a descriptor and cast it to its canonical form.
//!
//! The same algorithm runs on both sides of a call: on the raw arguments before the target
//! function is invoked and on whatever the target function returns.
//!
//! Casting borrows the input and builds a new value; the input is never modified.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use common::value::{Val, ValNumber};
use ws_model::{ListDescriptor, Requiredness, ScalarDescriptor, ScalarKind, StructDescriptor, TypeDescriptor};

use crate::error::{PathSegment, ValidationError};

static FLOAT_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?[0-9]*\.?[0-9]*([eE][+-]?[0-9]+)?$").expect("Invalid float pattern")
});

/// What to do with struct keys that the descriptor does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Drop them silently (lenient towards clients that send more than we declare).
    #[default]
    Discard,
    /// Fail with [`ValidationError::UnknownKeys`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastOptions {
    pub unknown_fields: UnknownFieldPolicy,
}

impl CastOptions {
    pub fn strict() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
        }
    }
}

/// Cast `value` against `descriptor` with the default (lenient) options.
pub fn cast(descriptor: &TypeDescriptor, value: &Val) -> Result<Val, ValidationError> {
    cast_with(descriptor, value, &CastOptions::default())
}

pub fn cast_with(
    descriptor: &TypeDescriptor,
    value: &Val,
    options: &CastOptions,
) -> Result<Val, ValidationError> {
    match descriptor {
        TypeDescriptor::Scalar(scalar) => cast_scalar(scalar, value),
        TypeDescriptor::Struct(structure) => cast_struct(structure, value, options),
        TypeDescriptor::List(list) => cast_list(list, value, options),
    }
}

fn cast_scalar(descriptor: &ScalarDescriptor, value: &Val) -> Result<Val, ValidationError> {
    if value.is_composite() {
        return Err(ValidationError::ScalarExpected {
            actual: value.kind_name(),
        });
    }

    if let Val::Null = value {
        return if descriptor.allow_null {
            Ok(Val::Null)
        } else {
            Err(ValidationError::NullNotAllowed)
        };
    }

    match descriptor.kind {
        ScalarKind::Boolean => cast_boolean(value),
        ScalarKind::Integer => cast_integer(value),
        ScalarKind::Float => cast_float(value),
        ScalarKind::Text => cast_text(value),
    }
}

/// Only `true`, `false`, `0`, `1`, `"0"` and `"1"` are booleans.
fn cast_boolean(value: &Val) -> Result<Val, ValidationError> {
    match value {
        Val::Bool(b) => Ok(Val::Bool(*b)),
        Val::Number(ValNumber::I64(0) | ValNumber::U64(0)) => Ok(Val::Bool(false)),
        Val::Number(ValNumber::I64(1) | ValNumber::U64(1)) => Ok(Val::Bool(true)),
        Val::String(s) if s == "0" => Ok(Val::Bool(false)),
        Val::String(s) if s == "1" => Ok(Val::Bool(true)),
        other => Err(ValidationError::InvalidBoolean(other.to_string())),
    }
}

fn cast_integer(value: &Val) -> Result<Val, ValidationError> {
    let invalid = || ValidationError::InvalidScalar {
        kind: ScalarKind::Integer,
        value: value.to_string(),
    };

    match value {
        Val::Number(n) => n.as_i64().map(Val::from).ok_or_else(invalid),
        // Text must already be in canonical form: no padding, no sign on positives, no leading zeros.
        Val::String(s) => s
            .parse::<i64>()
            .ok()
            .filter(|n| n.to_string() == *s)
            .map(Val::from)
            .ok_or_else(invalid),
        // `true` renders as "1"; `false` renders as "" which is not an integer.
        Val::Bool(true) => Ok(Val::from(1i64)),
        _ => Err(invalid()),
    }
}

fn cast_float(value: &Val) -> Result<Val, ValidationError> {
    let invalid = || ValidationError::InvalidScalar {
        kind: ScalarKind::Float,
        value: value.to_string(),
    };

    match value {
        Val::Number(n) => Ok(Val::from(n.as_f64())),
        Val::String(s) if s.chars().any(|c| c.is_ascii_digit()) && FLOAT_TEXT.is_match(s) => s
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Val::from)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn cast_text(value: &Val) -> Result<Val, ValidationError> {
    match value {
        Val::String(s) => Ok(Val::String(s.clone())),
        Val::Number(n) => Ok(Val::String(n.to_string())),
        Val::Bool(true) => Ok(Val::from("1")),
        Val::Bool(false) => Ok(Val::from("")),
        other => Err(ValidationError::InvalidScalar {
            kind: ScalarKind::Text,
            value: other.to_string(),
        }),
    }
}

fn cast_struct(
    descriptor: &StructDescriptor,
    value: &Val,
    options: &CastOptions,
) -> Result<Val, ValidationError> {
    let Val::Object(object) = value else {
        return Err(ValidationError::StructExpected {
            actual: value.kind_name(),
        });
    };

    // Working copy: each declared field is removed once processed, what is left is undeclared.
    let mut remaining: IndexMap<&str, &Val> =
        object.iter().map(|(k, v)| (k.as_str(), v)).collect();
    let mut result = IndexMap::with_capacity(descriptor.fields.len());

    for (key, field) in &descriptor.fields {
        let cast_value = match remaining.shift_remove(key.as_str()) {
            Some(field_value) => Some(cast_with(field, field_value, options)),
            None => match field.requiredness() {
                Requiredness::Required => {
                    return Err(ValidationError::MissingKey(key.clone()));
                }
                Requiredness::Optional => None,
                Requiredness::Default(default) => Some(cast_with(field, default, options)),
            },
        };

        if let Some(cast_value) = cast_value {
            result.insert(key.clone(), cast_value.map_err(|e| e.at_field(key))?);
        }
    }

    if !remaining.is_empty() {
        let unknown = remaining
            .keys()
            .map(|key| key.to_string())
            .collect::<Vec<_>>();

        match options.unknown_fields {
            UnknownFieldPolicy::Discard => {
                debug!(keys = ?unknown, "Discarding undeclared struct keys");
            }
            UnknownFieldPolicy::Reject => return Err(ValidationError::UnknownKeys(unknown)),
        }
    }

    Ok(Val::Object(result))
}

fn cast_list(
    descriptor: &ListDescriptor,
    value: &Val,
    options: &CastOptions,
) -> Result<Val, ValidationError> {
    let Val::List(items) = value else {
        return Err(ValidationError::ListExpected {
            actual: value.kind_name(),
        });
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            cast_with(&descriptor.element, item, options)
                .map_err(|e| e.at(PathSegment::Index(index)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Val::List)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    fn val(value: serde_json::Value) -> Val {
        value.into()
    }

    fn person() -> TypeDescriptor {
        TypeDescriptor::structure([
            ("name", TypeDescriptor::text()),
            ("active", TypeDescriptor::boolean().with_default(true)),
        ])
    }

    #[multiplatform_test]
    fn boolean_accepts_exactly_six_forms() {
        let descriptor = TypeDescriptor::boolean();

        for (input, expected) in [
            (json!(true), true),
            (json!(false), false),
            (json!(0), false),
            (json!(1), true),
            (json!("0"), false),
            (json!("1"), true),
        ] {
            assert_eq!(cast(&descriptor, &val(input)), Ok(Val::Bool(expected)));
        }

        for input in [
            json!(2),
            json!(-1),
            json!(1.0),
            json!("true"),
            json!("yes"),
            json!(""),
            json!(" 1"),
            json!(null),
            json!([1]),
            json!({"a": 1}),
        ] {
            let input = val(input);
            assert!(
                cast(&descriptor, &input).is_err(),
                "{input} should not be a boolean"
            );
        }
    }

    #[multiplatform_test]
    fn scalars_never_accept_aggregates() {
        for descriptor in [
            TypeDescriptor::integer(),
            TypeDescriptor::float(),
            TypeDescriptor::text().allow_null(),
        ] {
            assert_eq!(
                cast(&descriptor, &val(json!([]))),
                Err(ValidationError::ScalarExpected { actual: "list" })
            );
            assert_eq!(
                cast(&descriptor, &val(json!({}))),
                Err(ValidationError::ScalarExpected { actual: "object" })
            );
        }
    }

    #[multiplatform_test]
    fn integers() {
        let descriptor = TypeDescriptor::integer();

        assert_eq!(cast(&descriptor, &val(json!(42))), Ok(Val::from(42i64)));
        assert_eq!(cast(&descriptor, &val(json!(-7))), Ok(Val::from(-7i64)));
        assert_eq!(cast(&descriptor, &val(json!(3.0))), Ok(Val::from(3i64)));
        assert_eq!(cast(&descriptor, &val(json!("12"))), Ok(Val::from(12i64)));
        assert_eq!(cast(&descriptor, &val(json!(true))), Ok(Val::from(1i64)));

        for input in [json!(3.5), json!("12a"), json!("012"), json!(" 12"), json!(false)] {
            let input = val(input);
            let err = cast(&descriptor, &input).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid integer value: {input}"));
        }
    }

    #[multiplatform_test]
    fn floats() {
        let descriptor = TypeDescriptor::float();

        assert_eq!(cast(&descriptor, &val(json!(1.5))), Ok(Val::from(1.5)));
        assert_eq!(cast(&descriptor, &val(json!(2))), Ok(Val::from(2.0)));
        assert_eq!(cast(&descriptor, &val(json!("-0.25"))), Ok(Val::from(-0.25)));
        assert_eq!(cast(&descriptor, &val(json!("1e3"))), Ok(Val::from(1000.0)));
        assert_eq!(cast(&descriptor, &val(json!(".5"))), Ok(Val::from(0.5)));

        for input in [json!("inf"), json!("NaN"), json!("."), json!("1.2.3"), json!(true)] {
            assert!(cast(&descriptor, &val(input)).is_err());
        }
    }

    #[multiplatform_test]
    fn text() {
        let descriptor = TypeDescriptor::text();

        assert_eq!(cast(&descriptor, &val(json!("hi"))), Ok(Val::from("hi")));
        assert_eq!(cast(&descriptor, &val(json!(12))), Ok(Val::from("12")));
        assert_eq!(cast(&descriptor, &val(json!(true))), Ok(Val::from("1")));
        assert_eq!(
            cast(&descriptor, &val(json!(null))),
            Err(ValidationError::NullNotAllowed)
        );
        assert_eq!(
            cast(&descriptor.clone().allow_null(), &val(json!(null))),
            Ok(Val::Null)
        );
    }

    #[multiplatform_test]
    fn struct_defaults() {
        let descriptor = person();

        assert_eq!(
            cast(&descriptor, &val(json!({"name": "a"}))),
            Ok(val(json!({"name": "a", "active": true})))
        );
        assert_eq!(
            cast(&descriptor, &val(json!({"name": "a", "active": "1"}))),
            Ok(val(json!({"name": "a", "active": true})))
        );

        let err = cast(&descriptor, &val(json!({}))).unwrap_err();
        assert_eq!(err, ValidationError::MissingKey("name".to_string()));
        assert!(err.to_string().ends_with("name"));
    }

    #[multiplatform_test]
    fn struct_output_follows_declaration_order() {
        let output = cast(&person(), &val(json!({"active": 0, "name": "b"}))).unwrap();
        let Val::Object(fields) = output else {
            panic!("expected an object")
        };
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["name", "active"]);
    }

    #[multiplatform_test]
    fn optional_fields_are_omitted() {
        let descriptor = TypeDescriptor::structure([
            ("id", TypeDescriptor::integer()),
            ("email", TypeDescriptor::text().optional()),
        ]);

        assert_eq!(
            cast(&descriptor, &val(json!({"id": 1}))),
            Ok(val(json!({"id": 1})))
        );
    }

    #[multiplatform_test]
    fn unknown_keys() {
        let input = val(json!({"name": "a", "extra": 1, "more": [1]}));

        assert_eq!(
            cast(&person(), &input),
            Ok(val(json!({"name": "a", "active": true})))
        );
        assert_eq!(
            cast_with(&person(), &input, &CastOptions::strict()),
            Err(ValidationError::UnknownKeys(vec![
                "extra".to_string(),
                "more".to_string()
            ]))
        );
    }

    #[multiplatform_test]
    fn struct_rejects_non_objects() {
        assert_eq!(
            cast(&person(), &val(json!([{"name": "a"}]))),
            Err(ValidationError::StructExpected { actual: "list" })
        );
        assert_eq!(
            cast(&person(), &val(json!("a"))),
            Err(ValidationError::StructExpected { actual: "string" })
        );
    }

    #[multiplatform_test]
    fn list_preserves_order() {
        let descriptor = TypeDescriptor::list(person());

        let output = cast(
            &descriptor,
            &val(json!([{"name": "first", "active": 0}, {"name": "second"}])),
        );

        assert_eq!(
            output,
            Ok(val(json!([
                {"name": "first", "active": false},
                {"name": "second", "active": true}
            ])))
        );
    }

    #[multiplatform_test]
    fn list_errors_carry_the_path() {
        let descriptor = TypeDescriptor::structure([("people", TypeDescriptor::list(person()))]);

        let err = cast(
            &descriptor,
            &val(json!({"people": [{"name": "a"}, {"active": true}]})),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "people[1]: Missing required key in single structure: name"
        );

        assert_eq!(
            cast(&descriptor, &val(json!({"people": {"name": "a"}}))).unwrap_err(),
            ValidationError::ListExpected { actual: "object" }.at_field("people")
        );
    }

    #[multiplatform_test]
    fn idempotent() {
        let descriptor = TypeDescriptor::structure([
            ("id", TypeDescriptor::integer()),
            ("ratio", TypeDescriptor::float().with_default(1i64)),
            ("label", TypeDescriptor::text().allow_null()),
            (
                "flags",
                TypeDescriptor::list(TypeDescriptor::boolean()).with_default(Val::empty_list()),
            ),
            ("people", TypeDescriptor::list(person())),
        ]);

        let inputs = [
            json!({"id": "5", "label": 3, "people": []}),
            json!({"id": 5.0, "ratio": "2.5", "label": null, "flags": [1, "0"], "people": [{"name": 7, "active": "1"}], "stray": true}),
        ];

        for input in inputs {
            let once = cast(&descriptor, &val(input)).unwrap();
            let twice = cast(&descriptor, &once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[multiplatform_test]
    fn input_is_not_modified() {
        let input = val(json!({"name": "a", "extra": 1}));
        let before = input.clone();
        let _ = cast(&person(), &input);
        assert_eq!(input, before);
    }
}
