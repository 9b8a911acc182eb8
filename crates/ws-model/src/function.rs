// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Debug;
use std::sync::Arc;

use common::value::Val;
use indexmap::IndexMap;
use thiserror::Error;

use crate::descriptor::TypeDescriptor;

/// Cast arguments, keyed by parameter name in declaration order.
pub type CallArguments = IndexMap<String, Val>;

/// An error raised by a target function.
///
/// `error_code` is the stable machine-readable code that ends up as the fault actor.
/// `debug_info` is only ever put on the wire when diagnostics are enabled.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ServiceError {
    pub error_code: String,
    pub message: String,
    pub debug_info: Option<String>,
}

impl ServiceError {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            debug_info: None,
        }
    }

    pub fn with_debug_info(mut self, debug_info: impl Into<String>) -> Self {
        self.debug_info = Some(debug_info.into());
        self
    }
}

/// The callable behind an exposed function.
///
/// Receives arguments already cast against the parameter descriptors. Void functions return
/// `Val::Null`; the value is dropped by the adapter.
pub trait ExternalFunction: Send + Sync {
    fn invoke(&self, arguments: &CallArguments) -> Result<Val, ServiceError>;
}

impl<F> ExternalFunction for F
where
    F: Fn(&CallArguments) -> Result<Val, ServiceError> + Send + Sync,
{
    fn invoke(&self, arguments: &CallArguments) -> Result<Val, ServiceError> {
        self(arguments)
    }
}

#[derive(Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<(String, TypeDescriptor)>,
    /// `None` for void functions.
    pub returns: Option<TypeDescriptor>,
    pub target: Arc<dyn ExternalFunction>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, target: Arc<dyn ExternalFunction>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: vec![],
            returns: None,
            target,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.parameters.push((name.into(), descriptor));
        self
    }

    pub fn with_returns(mut self, descriptor: TypeDescriptor) -> Self {
        self.returns = Some(descriptor);
        self
    }
}

impl Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}
