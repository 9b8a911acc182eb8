// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::de::Error;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl ValNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            ValNumber::I64(n) => *n as f64,
            ValNumber::U64(n) => *n as f64,
            ValNumber::F64(n) => *n,
        }
    }

    /// The integral value, if the number is integral and fits an `i64`.
    ///
    /// Floats with a zero fractional part count as integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ValNumber::I64(n) => Some(*n),
            ValNumber::U64(n) => i64::try_from(*n).ok(),
            ValNumber::F64(n) => {
                if n.is_finite() && n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64
                {
                    Some(*n as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, ValNumber::I64(_) | ValNumber::U64(_))
    }
}

impl Display for ValNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValNumber::I64(n) => write!(f, "{n}"),
            ValNumber::U64(n) => write!(f, "{n}"),
            ValNumber::F64(n) => write!(f, "{n}"),
        }
    }
}

impl TryFrom<ValNumber> for serde_json::Number {
    type Error = ();

    fn try_from(value: ValNumber) -> Result<Self, Self::Error> {
        match value {
            ValNumber::I64(n) => Ok(serde_json::Number::from(n)),
            ValNumber::U64(n) => Ok(serde_json::Number::from(n)),
            ValNumber::F64(n) => serde_json::Number::from_f64(n).ok_or(()),
        }
    }
}

impl From<serde_json::Number> for ValNumber {
    fn from(value: serde_json::Number) -> Self {
        if let Some(n) = value.as_i64() {
            ValNumber::I64(n)
        } else if let Some(n) = value.as_u64() {
            ValNumber::U64(n)
        } else {
            ValNumber::F64(value.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl From<i64> for ValNumber {
    fn from(value: i64) -> Self {
        ValNumber::I64(value)
    }
}

impl From<u64> for ValNumber {
    fn from(value: u64) -> Self {
        ValNumber::U64(value)
    }
}

impl From<f64> for ValNumber {
    fn from(value: f64) -> Self {
        ValNumber::F64(value)
    }
}

/// Represent a value that crosses the adapter boundary:
/// - raw arguments decoded by the transport engine
/// - cast arguments handed to a target function
/// - return values (before and after casting)
///
/// Objects keep their insertion order, so a cast record lists its fields in
/// declaration order.
///
/// (De)serializes as plain JSON, so descriptor defaults can be written naturally in service
/// definition files.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(from = "serde_json::Value")]
pub enum Val {
    Null,
    Bool(bool),
    Number(ValNumber),
    String(String),
    List(Vec<Val>),
    Object(IndexMap<String, Val>),
}

impl Val {
    pub fn empty_list() -> Self {
        Val::List(vec![])
    }

    pub fn empty_object() -> Self {
        Val::Object(IndexMap::new())
    }

    /// Lists and objects are composite; everything else is a scalar.
    pub fn is_composite(&self) -> bool {
        matches!(self, Val::List(_) | Val::Object(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Number(n) if n.is_integral() => "integer",
            Val::Number(_) => "float",
            Val::String(_) => "string",
            Val::List(_) => "list",
            Val::Object(_) => "object",
        }
    }
}

impl Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Number(n) => write!(f, "{n}"),
            Val::String(s) => write!(f, "\"{s}\""),
            Val::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Val::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Val {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Val::Null => serializer.serialize_unit(),
            Val::Bool(b) => serializer.serialize_bool(*b),
            Val::Number(ValNumber::I64(n)) => serializer.serialize_i64(*n),
            Val::Number(ValNumber::U64(n)) => serializer.serialize_u64(*n),
            Val::Number(ValNumber::F64(n)) => serializer.serialize_f64(*n),
            Val::String(s) => serializer.serialize_str(s),
            Val::List(l) => l.serialize(serializer),
            Val::Object(o) => o.serialize(serializer),
        }
    }
}

impl TryFrom<Val> for serde_json::Value {
    type Error = serde_json::Error;

    fn try_from(value: Val) -> Result<Self, Self::Error> {
        match value {
            Val::Null => Ok(serde_json::Value::Null),
            Val::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Val::Number(n) => {
                Ok(serde_json::Value::Number(n.try_into().map_err(|_| {
                    serde_json::Error::custom("Invalid number")
                })?))
            }
            Val::String(s) => Ok(serde_json::Value::String(s)),
            Val::List(l) => Ok(serde_json::Value::Array(
                l.into_iter()
                    .map(|v| v.try_into())
                    .collect::<Result<_, _>>()?,
            )),
            Val::Object(o) => Ok(serde_json::Value::Object(
                o.into_iter()
                    .map(|(k, v)| Ok((k, v.try_into()?)))
                    .collect::<Result<_, serde_json::Error>>()?,
            )),
        }
    }
}

impl From<serde_json::Value> for Val {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Val::Null,
            serde_json::Value::Bool(b) => Val::Bool(b),
            serde_json::Value::Number(n) => Val::Number(n.into()),
            serde_json::Value::String(s) => Val::String(s),
            serde_json::Value::Array(l) => Val::List(l.into_iter().map(|v| v.into()).collect()),
            serde_json::Value::Object(o) => {
                Val::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<bool> for Val {
    fn from(value: bool) -> Self {
        Val::Bool(value)
    }
}

impl From<i64> for Val {
    fn from(value: i64) -> Self {
        Val::Number(ValNumber::I64(value))
    }
}

impl From<f64> for Val {
    fn from(value: f64) -> Self {
        Val::Number(ValNumber::F64(value))
    }
}

impl From<&str> for Val {
    fn from(value: &str) -> Self {
        Val::String(value.to_string())
    }
}

impl From<String> for Val {
    fn from(value: String) -> Self {
        Val::String(value)
    }
}
