// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Turning a [`FunctionDescriptor`] into an [`ExposedMethod`].
//!
//! Exposure happens in two steps. [`validate_function`] rejects descriptors that contradict
//! themselves without touching any registry state. [`expose_function`] then allocates composite
//! type names, materializes parameter defaults and produces the method together with the
//! complex types it introduces.

use std::fmt::Display;
use std::sync::Arc;

use common::value::Val;
use tracing::{debug, instrument};
use ws_model::{
    CallArguments, ExternalFunction, FunctionDescriptor, Requiredness, ScalarKind, TypeDescriptor,
};

use crate::cast::{CastOptions, cast, cast_with};
use crate::error::{CallError, ConfigurationError, ValidationError};
use crate::naming::{FieldPath, NameAllocator};

/// Who the registry is built for. Only used to annotate the documentation of complex types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExposureContext {
    pub principal: String,
    pub context_id: String,
}

impl ExposureContext {
    pub fn new(principal: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            context_id: context_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarKind),
    Complex(String),
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Scalar(kind) => write!(f, "{}", kind.wire_name()),
            TypeRef::Complex(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexField {
    pub name: String,
    pub type_ref: TypeRef,
    /// `false` for both OPTIONAL and DEFAULT fields: either way the caller may leave it out.
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexShape {
    Struct { fields: Vec<ComplexField> },
    List { element: TypeRef },
}

/// A named composite type introduced by an exposed method. The type table consumed by whatever
/// generates the service description document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    pub shape: ComplexShape,
    pub documentation: String,
}

/// A parameter default, already cast against the parameter descriptor.
///
/// Composite defaults are declared as `{}` or `[]`; the cast value carries the defaults of any
/// nested fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterDefault {
    Scalar(Val),
    Struct(Val),
    List(Val),
}

impl ParameterDefault {
    pub fn value(&self) -> Val {
        match self {
            ParameterDefault::Scalar(value)
            | ParameterDefault::Struct(value)
            | ParameterDefault::List(value) => value.clone(),
        }
    }

    /// The default as written in a signature: `null`, `true`, `42`, `'text'`, `{}` or `[]`.
    pub fn literal(&self) -> String {
        match self {
            ParameterDefault::Scalar(Val::String(text)) => {
                format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            ParameterDefault::Scalar(value) => value.to_string(),
            ParameterDefault::Struct(_) => "{}".to_string(),
            ParameterDefault::List(_) => "[]".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExposedParameter {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub type_ref: TypeRef,
    pub default: Option<ParameterDefault>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExposedReturn {
    pub descriptor: TypeDescriptor,
    pub type_ref: TypeRef,
}

/// A callable entry point: cast the arguments, invoke the target, cast the result.
#[derive(Clone)]
pub struct ExposedMethod {
    name: String,
    description: String,
    parameters: Vec<ExposedParameter>,
    returns: Option<ExposedReturn>,
    target: Arc<dyn ExternalFunction>,
    options: CastOptions,
}

impl ExposedMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ExposedParameter] {
        &self.parameters
    }

    pub fn returns(&self) -> Option<&ExposedReturn> {
        self.returns.as_ref()
    }

    /// `name(param: type = default, ...) -> type`, with `void` for functions returning nothing.
    pub fn signature(&self) -> String {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| match &parameter.default {
                Some(default) => format!(
                    "{}: {} = {}",
                    parameter.name,
                    parameter.type_ref,
                    default.literal()
                ),
                None => format!("{}: {}", parameter.name, parameter.type_ref),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let returns = match &self.returns {
            Some(returns) => returns.type_ref.to_string(),
            None => "void".to_string(),
        };

        format!("{}({parameters}) -> {returns}", self.name)
    }

    /// Call the target with positional raw arguments.
    ///
    /// Missing trailing arguments take their default; surplus arguments are ignored. Returns
    /// `None` for void functions.
    #[instrument(skip_all, fields(method = %self.name))]
    pub fn invoke(&self, arguments: &[Val]) -> Result<Option<Val>, CallError> {
        if arguments.len() > self.parameters.len() {
            debug!(
                surplus = arguments.len() - self.parameters.len(),
                "Ignoring surplus arguments"
            );
        }

        let mut cast_arguments = CallArguments::with_capacity(self.parameters.len());

        for (index, parameter) in self.parameters.iter().enumerate() {
            let value = match (arguments.get(index), &parameter.default) {
                (Some(raw), _) => cast_with(&parameter.descriptor, raw, &self.options)
                    .map_err(|e| {
                        debug!(parameter = %parameter.name, error = %e, "Invalid parameter");
                        CallError::InvalidParameter(e.at_field(&parameter.name))
                    })?,
                (None, Some(default)) => default.value(),
                (None, None) => {
                    return Err(CallError::InvalidParameter(
                        ValidationError::MissingParameter(parameter.name.clone()),
                    ));
                }
            };
            cast_arguments.insert(parameter.name.clone(), value);
        }

        let result = self.target.invoke(&cast_arguments)?;

        match &self.returns {
            Some(returns) => cast_with(&returns.descriptor, &result, &self.options)
                .map(Some)
                .map_err(|e| {
                    debug!(error = %e, "Invalid response");
                    CallError::InvalidResponse(e)
                }),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for ExposedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExposedMethod")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Check that a function's descriptors are consistent.
///
/// - only scalars may be optional or carry a non-empty default
/// - scalar defaults must cast against their own descriptor
/// - top-level parameters are positional and cannot be optional
pub fn validate_function(function: &FunctionDescriptor) -> Result<(), ConfigurationError> {
    for (name, descriptor) in &function.parameters {
        validate_descriptor(&function.name, &FieldPath::parameter(name), descriptor)?;

        if let Requiredness::Optional = descriptor.requiredness() {
            return Err(ConfigurationError::OptionalParameter {
                function: function.name.clone(),
                parameter: name.clone(),
            });
        }
    }

    if let Some(returns) = &function.returns {
        validate_descriptor(&function.name, &FieldPath::returns(), returns)?;
    }

    Ok(())
}

fn validate_descriptor(
    function: &str,
    path: &FieldPath,
    descriptor: &TypeDescriptor,
) -> Result<(), ConfigurationError> {
    match (descriptor, descriptor.requiredness()) {
        (TypeDescriptor::Scalar(_), _) => {}
        (_, Requiredness::Optional) => {
            return Err(ConfigurationError::OptionalComposite {
                function: function.to_string(),
                location: path.to_string(),
                shape: descriptor.shape_name(),
            });
        }
        (_, Requiredness::Default(default))
            if Some(default) != descriptor.canonical_empty().as_ref() =>
        {
            return Err(ConfigurationError::NonEmptyCompositeDefault {
                function: function.to_string(),
                location: path.to_string(),
                shape: descriptor.shape_name(),
            });
        }
        _ => {}
    }

    // A default stands in for an absent value, so it must cast on its own. For a struct this
    // means every field of `{}` is itself optional or defaulted.
    if let Requiredness::Default(default) = descriptor.requiredness() {
        cast(descriptor, default).map_err(|cause| ConfigurationError::InvalidDefault {
            function: function.to_string(),
            location: path.to_string(),
            cause,
        })?;
    }

    match descriptor {
        TypeDescriptor::Scalar(_) => Ok(()),
        TypeDescriptor::Struct(structure) => structure
            .fields
            .iter()
            .try_for_each(|(name, field)| validate_descriptor(function, &path.field(name), field)),
        TypeDescriptor::List(list) => validate_descriptor(function, &path.element(), &list.element),
    }
}

/// Build the exposed method for an already validated function.
///
/// Returns the complex types the method introduces, each parent before its children.
pub fn expose_function(
    function: &FunctionDescriptor,
    names: &mut NameAllocator,
    context: &ExposureContext,
    options: CastOptions,
) -> Result<(ExposedMethod, Vec<ComplexType>), ConfigurationError> {
    let mut table = TypeTableBuilder {
        function: &function.name,
        names,
        context,
        types: vec![],
    };

    let mut parameters = Vec::with_capacity(function.parameters.len());
    for (name, descriptor) in &function.parameters {
        let path = FieldPath::parameter(name);
        let type_ref = table.type_ref(&path, &path.root_prefix(&function.name), descriptor);

        parameters.push(ExposedParameter {
            name: name.clone(),
            descriptor: descriptor.clone(),
            type_ref,
            default: materialize_default(&function.name, &path, descriptor)?,
        });
    }

    let returns = function.returns.as_ref().map(|descriptor| {
        let path = FieldPath::returns();
        ExposedReturn {
            descriptor: descriptor.clone(),
            type_ref: table.type_ref(&path, &path.root_prefix(&function.name), descriptor),
        }
    });

    let types = table.types;

    Ok((
        ExposedMethod {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters,
            returns,
            target: function.target.clone(),
            options,
        },
        types,
    ))
}

fn materialize_default(
    function: &str,
    path: &FieldPath,
    descriptor: &TypeDescriptor,
) -> Result<Option<ParameterDefault>, ConfigurationError> {
    let Requiredness::Default(default) = descriptor.requiredness() else {
        return Ok(None);
    };

    let value = cast(descriptor, default).map_err(|cause| ConfigurationError::InvalidDefault {
        function: function.to_string(),
        location: path.to_string(),
        cause,
    })?;

    let materialized = match descriptor {
        TypeDescriptor::Scalar(_) => ParameterDefault::Scalar(value),
        TypeDescriptor::Struct(_) => ParameterDefault::Struct(value),
        TypeDescriptor::List(_) => ParameterDefault::List(value),
    };

    Ok(Some(materialized))
}

struct TypeTableBuilder<'a> {
    function: &'a str,
    names: &'a mut NameAllocator,
    context: &'a ExposureContext,
    types: Vec<ComplexType>,
}

impl TypeTableBuilder<'_> {
    fn type_ref(&mut self, path: &FieldPath, prefix: &str, descriptor: &TypeDescriptor) -> TypeRef {
        match descriptor {
            TypeDescriptor::Scalar(scalar) => TypeRef::Scalar(scalar.kind),
            TypeDescriptor::Struct(structure) => {
                let name = self.names.allocate(self.function, path, prefix);
                // Reserve the slot so the parent precedes the types its fields introduce
                let index = self.types.len();

                let mut fields = Vec::with_capacity(structure.fields.len());
                for (field_name, field) in &structure.fields {
                    let type_ref =
                        self.type_ref(&path.field(field_name), &format!("{name}_{field_name}"), field);
                    fields.push(ComplexField {
                        name: field_name.clone(),
                        type_ref,
                        required: matches!(field.requiredness(), Requiredness::Required),
                        description: field.description().map(str::to_string),
                    });
                }

                let documentation = self.documentation("struct", descriptor.description());
                self.types.insert(
                    index,
                    ComplexType {
                        name: name.clone(),
                        shape: ComplexShape::Struct { fields },
                        documentation,
                    },
                );
                TypeRef::Complex(name)
            }
            TypeDescriptor::List(list) => {
                let name = self.names.allocate(self.function, path, &format!("{prefix}Array"));
                let index = self.types.len();

                let element_prefix = match list.element.as_ref() {
                    TypeDescriptor::List(_) => format!("{prefix}Item"),
                    _ => prefix.to_string(),
                };
                let element = self.type_ref(&path.element(), &element_prefix, &list.element);

                let documentation = self.documentation("list", descriptor.description());
                self.types.insert(
                    index,
                    ComplexType {
                        name: name.clone(),
                        shape: ComplexShape::List { element },
                        documentation,
                    },
                );
                TypeRef::Complex(name)
            }
        }
    }

    fn documentation(&self, shape: &str, description: Option<&str>) -> String {
        let annotation = format!(
            "Virtual {shape} type for web services for principal '{}' in context '{}'",
            self.context.principal, self.context.context_id
        );
        match description {
            Some(description) => format!("{description}\n{annotation}"),
            None => annotation,
        }
    }
}
