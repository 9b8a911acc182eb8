// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::value::Val;
use indexmap::IndexMap;
use tracing::{debug, warn};
use ws_model::FunctionDescriptor;

use crate::cast::CastOptions;
use crate::error::{CallError, ConfigurationError};
use crate::exposure::{
    ComplexType, ExposedMethod, ExposureContext, expose_function, validate_function,
};
use crate::naming::NameAllocator;

/// All methods exposed by one server, built once and read-only afterwards.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    methods: IndexMap<String, ExposedMethod>,
    complex_types: IndexMap<String, ComplexType>,
    names: NameAllocator,
}

/// Outcome of [`AdapterRegistry::build`]: a rejected function never prevents the others from
/// being exposed.
#[derive(Debug)]
pub struct RegistryBuild {
    pub registry: AdapterRegistry,
    pub rejected: Vec<ConfigurationError>,
}

impl AdapterRegistry {
    pub fn build(
        functions: impl IntoIterator<Item = FunctionDescriptor>,
        context: &ExposureContext,
        options: CastOptions,
    ) -> RegistryBuild {
        let mut registry = AdapterRegistry::default();
        let mut rejected = vec![];

        for function in functions {
            if let Err(error) = registry.expose(&function, context, options) {
                warn!(function = %error.function(), %error, "Function not exposed");
                rejected.push(error);
            }
        }

        debug!(
            methods = registry.methods.len(),
            complex_types = registry.complex_types.len(),
            "Adapter registry built"
        );

        RegistryBuild { registry, rejected }
    }

    fn expose(
        &mut self,
        function: &FunctionDescriptor,
        context: &ExposureContext,
        options: CastOptions,
    ) -> Result<(), ConfigurationError> {
        if self.methods.contains_key(&function.name) {
            return Err(ConfigurationError::DuplicateFunction {
                function: function.name.clone(),
            });
        }

        // Nothing is allocated for a function that fails validation
        validate_function(function)?;

        let (method, types) = expose_function(function, &mut self.names, context, options)?;

        self.complex_types
            .extend(types.into_iter().map(|t| (t.name.clone(), t)));
        self.methods.insert(function.name.clone(), method);

        Ok(())
    }

    pub fn method(&self, name: &str) -> Option<&ExposedMethod> {
        self.methods.get(name)
    }

    /// Methods in the order their functions were declared.
    pub fn methods(&self) -> impl Iterator<Item = &ExposedMethod> {
        self.methods.values()
    }

    pub fn complex_types(&self) -> impl Iterator<Item = &ComplexType> {
        self.complex_types.values()
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    pub fn call(&self, name: &str, arguments: &[Val]) -> Result<Option<Val>, CallError> {
        self.method(name)
            .ok_or_else(|| CallError::MethodNotFound(name.to_string()))?
            .invoke(arguments)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
