// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;
use ws_model::{ScalarKind, ServiceError};

use crate::fault::FaultCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

fn render_path(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) if rendered.is_empty() => rendered.push_str(name),
            PathSegment::Field(name) => {
                rendered.push('.');
                rendered.push_str(name);
            }
            PathSegment::Index(index) => rendered.push_str(&format!("[{index}]")),
        }
    }
    rendered
}

/// A value does not satisfy a descriptor.
///
/// Raised identically for inbound parameters and outbound return values; the caller decides
/// which side of the call it is reported on (see [`CallError`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Scalar type expected, {actual} received")]
    ScalarExpected { actual: &'static str },

    #[error("Struct expected, {actual} received")]
    StructExpected { actual: &'static str },

    #[error("List expected, {actual} received")]
    ListExpected { actual: &'static str },

    #[error("Null value not allowed")]
    NullNotAllowed,

    #[error("Invalid boolean value: {0}")]
    InvalidBoolean(String),

    #[error("Invalid {} value: {value}", kind_label(.kind))]
    InvalidScalar { kind: ScalarKind, value: String },

    #[error("Missing required key in single structure: {0}")]
    MissingKey(String),

    #[error("Unexpected keys in single structure: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("{}: {cause}", render_path(.path))]
    At {
        path: Vec<PathSegment>,
        cause: Box<ValidationError>,
    },
}

fn kind_label(kind: &ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Boolean => "boolean",
        ScalarKind::Integer => "integer",
        ScalarKind::Float => "float",
        ScalarKind::Text => "text",
    }
}

impl ValidationError {
    /// Prefix the location of this error with `segment`.
    pub fn at(self, segment: PathSegment) -> Self {
        match self {
            ValidationError::At { mut path, cause } => {
                path.insert(0, segment);
                ValidationError::At { path, cause }
            }
            other => ValidationError::At {
                path: vec![segment],
                cause: Box::new(other),
            },
        }
    }

    pub fn at_field(self, field: &str) -> Self {
        self.at(PathSegment::Field(field.to_string()))
    }

    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::At { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// A function descriptor is self-contradictory. Fatal to exposing that one function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Function '{function}': '{location}' is a {shape} and cannot be optional")]
    OptionalComposite {
        function: String,
        location: String,
        shape: &'static str,
    },

    #[error("Function '{function}': '{location}' is a {shape} and may only default to an empty value")]
    NonEmptyCompositeDefault {
        function: String,
        location: String,
        shape: &'static str,
    },

    #[error(
        "Function '{function}': parameter '{parameter}' cannot be optional, declare a default instead"
    )]
    OptionalParameter { function: String, parameter: String },

    #[error("Function '{function}': default for '{location}' is invalid: {cause}")]
    InvalidDefault {
        function: String,
        location: String,
        cause: ValidationError,
    },

    #[error("Function '{function}' is already exposed")]
    DuplicateFunction { function: String },
}

impl ConfigurationError {
    pub fn function(&self) -> &str {
        match self {
            ConfigurationError::OptionalComposite { function, .. }
            | ConfigurationError::NonEmptyCompositeDefault { function, .. }
            | ConfigurationError::OptionalParameter { function, .. }
            | ConfigurationError::InvalidDefault { function, .. }
            | ConfigurationError::DuplicateFunction { function } => function,
        }
    }
}

/// Failure of a single call through an exposed method.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("Invalid parameter value detected")]
    InvalidParameter(ValidationError),

    #[error("Invalid response value detected")]
    InvalidResponse(ValidationError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Method {0} not found")]
    MethodNotFound(String),
}

impl CallError {
    pub fn error_code(&self) -> &str {
        match self {
            CallError::InvalidParameter(_) => "invalidparameter",
            CallError::InvalidResponse(_) => "invalidresponse",
            CallError::Service(e) => &e.error_code,
            CallError::MethodNotFound(_) => "methodnotfound",
        }
    }

    /// The user-facing message, free of any debug detail.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn debug_info(&self) -> Option<String> {
        match self {
            CallError::InvalidParameter(e) | CallError::InvalidResponse(e) => Some(e.to_string()),
            CallError::Service(e) => e.debug_info.clone(),
            CallError::MethodNotFound(_) => None,
        }
    }

    /// Bad parameters and unknown methods are the caller's fault; everything else happened on
    /// our side, including a target function returning a value that breaks its own contract.
    pub fn fault_code(&self) -> FaultCode {
        match self {
            CallError::InvalidParameter(_) | CallError::MethodNotFound(_) => FaultCode::Sender,
            CallError::InvalidResponse(_) | CallError::Service(_) => FaultCode::Receiver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn nested_path_rendering() {
        let error = ValidationError::MissingKey("email".to_string())
            .at(PathSegment::Index(2))
            .at_field("users")
            .at_field("criteria");

        assert_eq!(
            error.to_string(),
            "criteria.users[2]: Missing required key in single structure: email"
        );
        assert_eq!(
            error.root_cause(),
            &ValidationError::MissingKey("email".to_string())
        );
    }

    #[multiplatform_test]
    fn call_error_classification() {
        let param = CallError::InvalidParameter(ValidationError::NullNotAllowed);
        assert_eq!(param.error_code(), "invalidparameter");
        assert_eq!(param.fault_code(), FaultCode::Sender);
        assert_eq!(param.debug_info().as_deref(), Some("Null value not allowed"));

        let response = CallError::InvalidResponse(ValidationError::MissingKey("id".to_string()));
        assert_eq!(response.error_code(), "invalidresponse");
        assert_eq!(response.fault_code(), FaultCode::Receiver);

        let service: CallError = ServiceError::new("nopermission", "Sorry").into();
        assert_eq!(service.error_code(), "nopermission");
        assert_eq!(service.to_string(), "Sorry");
        assert_eq!(service.debug_info(), None);
    }
}
