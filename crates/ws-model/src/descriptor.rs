// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The recursive type vocabulary used to declare function parameters and return values.
//!
//! A descriptor is pure data. Casting values against it lives in `ws-resolver`, as does the check
//! that a descriptor is self-consistent (only scalars may be optional or carry a non-empty
//! default). Inconsistent descriptors are representable on purpose: they can be loaded from
//! service definition files and must be reported, not rejected by the deserializer.

use common::value::Val;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Boolean,
    Integer,
    Float,
    Text,
}

impl ScalarKind {
    /// The wire type name used in generated signatures and type tables.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Integer => "int",
            ScalarKind::Float => "double",
            ScalarKind::Text => "string",
        }
    }
}

/// Whether a value must be supplied.
///
/// A default value exists exactly when the requiredness is `Default`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requiredness {
    #[default]
    Required,
    Optional,
    Default(Val),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypeDescriptor {
    Scalar(ScalarDescriptor),
    Struct(StructDescriptor),
    List(ListDescriptor),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarDescriptor {
    pub kind: ScalarKind,
    #[serde(default)]
    pub requiredness: Requiredness,
    #[serde(default)]
    pub allow_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDescriptor {
    /// Field order is significant: it is the order of cast records and of documentation.
    pub fields: IndexMap<String, TypeDescriptor>,
    #[serde(default)]
    pub requiredness: Requiredness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDescriptor {
    pub element: Box<TypeDescriptor>,
    #[serde(default)]
    pub requiredness: Requiredness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeDescriptor {
    pub fn scalar(kind: ScalarKind) -> Self {
        TypeDescriptor::Scalar(ScalarDescriptor {
            kind,
            requiredness: Requiredness::Required,
            allow_null: false,
            description: None,
        })
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::scalar(ScalarKind::Integer)
    }

    pub fn float() -> Self {
        Self::scalar(ScalarKind::Float)
    }

    pub fn text() -> Self {
        Self::scalar(ScalarKind::Text)
    }

    pub fn structure<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypeDescriptor)>) -> Self {
        TypeDescriptor::Struct(StructDescriptor {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            requiredness: Requiredness::Required,
            description: None,
        })
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(ListDescriptor {
            element: Box::new(element),
            requiredness: Requiredness::Required,
            description: None,
        })
    }

    pub fn required(mut self) -> Self {
        *self.requiredness_mut() = Requiredness::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        *self.requiredness_mut() = Requiredness::Optional;
        self
    }

    pub fn with_default(mut self, value: impl Into<Val>) -> Self {
        *self.requiredness_mut() = Requiredness::Default(value.into());
        self
    }

    /// Only meaningful on scalars; composites ignore it.
    pub fn allow_null(mut self) -> Self {
        if let TypeDescriptor::Scalar(scalar) = &mut self {
            scalar.allow_null = true;
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = Some(description.into());
        match &mut self {
            TypeDescriptor::Scalar(s) => s.description = description,
            TypeDescriptor::Struct(s) => s.description = description,
            TypeDescriptor::List(l) => l.description = description,
        }
        self
    }

    pub fn requiredness(&self) -> &Requiredness {
        match self {
            TypeDescriptor::Scalar(s) => &s.requiredness,
            TypeDescriptor::Struct(s) => &s.requiredness,
            TypeDescriptor::List(l) => &l.requiredness,
        }
    }

    fn requiredness_mut(&mut self) -> &mut Requiredness {
        match self {
            TypeDescriptor::Scalar(s) => &mut s.requiredness,
            TypeDescriptor::Struct(s) => &mut s.requiredness,
            TypeDescriptor::List(l) => &mut l.requiredness,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Scalar(s) => s.description.as_deref(),
            TypeDescriptor::Struct(s) => s.description.as_deref(),
            TypeDescriptor::List(l) => l.description.as_deref(),
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Scalar(_) => "scalar",
            TypeDescriptor::Struct(_) => "struct",
            TypeDescriptor::List(_) => "list",
        }
    }

    pub fn is_composite(&self) -> bool {
        !matches!(self, TypeDescriptor::Scalar(_))
    }

    /// The only default a composite may declare: `{}` for a struct, `[]` for a list.
    pub fn canonical_empty(&self) -> Option<Val> {
        match self {
            TypeDescriptor::Scalar(_) => None,
            TypeDescriptor::Struct(_) => Some(Val::empty_object()),
            TypeDescriptor::List(_) => Some(Val::empty_list()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn builders() {
        let descriptor = TypeDescriptor::integer().with_default(10i64).allow_null();
        match &descriptor {
            TypeDescriptor::Scalar(s) => {
                assert_eq!(s.kind, ScalarKind::Integer);
                assert_eq!(s.requiredness, Requiredness::Default(Val::from(10i64)));
                assert!(s.allow_null);
            }
            _ => panic!("expected a scalar"),
        }

        let list = TypeDescriptor::list(TypeDescriptor::text()).allow_null();
        assert_eq!(list.requiredness(), &Requiredness::Required);
        assert!(list.is_composite());
        assert_eq!(list.canonical_empty(), Some(Val::empty_list()));
    }

    #[multiplatform_test]
    fn field_order_is_declaration_order() {
        let descriptor = TypeDescriptor::structure([
            ("zeta", TypeDescriptor::text()),
            ("alpha", TypeDescriptor::integer()),
        ]);
        match descriptor {
            TypeDescriptor::Struct(s) => {
                assert_eq!(s.fields.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"])
            }
            _ => panic!("expected a struct"),
        }
    }

    #[multiplatform_test]
    fn deserialize_tagged() {
        let json = r#"{
            "type": "struct",
            "fields": {
                "name": {"type": "scalar", "kind": "text"},
                "active": {"type": "scalar", "kind": "boolean", "requiredness": {"default": true}},
                "tags": {"type": "list", "element": {"type": "scalar", "kind": "text"}, "requiredness": "optional"}
            }
        }"#;

        let descriptor: TypeDescriptor = serde_json::from_str(json).unwrap();
        let TypeDescriptor::Struct(s) = descriptor else {
            panic!("expected a struct")
        };

        assert_eq!(
            s.fields.keys().collect::<Vec<_>>(),
            vec!["name", "active", "tags"]
        );
        assert_eq!(
            s.fields["active"].requiredness(),
            &Requiredness::Default(Val::Bool(true))
        );
        // Representable; rejected later when the function is exposed.
        assert_eq!(s.fields["tags"].requiredness(), &Requiredness::Optional);
    }
}
