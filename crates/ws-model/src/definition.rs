// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Service definitions: the function directory as a JSON document.
//!
//! ```json
//! {
//!   "functions": [
//!     {
//!       "name": "get_users",
//!       "description": "Search users",
//!       "handler": "users::search",
//!       "parameters": {
//!         "criteria": {"type": "list", "element": {"type": "scalar", "kind": "text"}}
//!       },
//!       "returns": {"type": "list", "element": {"type": "scalar", "kind": "integer"}}
//!     }
//!   ]
//! }
//! ```
//!
//! Parameters keep their document order. The handler name defaults to the function name.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::TypeDescriptor;
use crate::function::{ExternalFunction, FunctionDescriptor};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub functions: Vec<FunctionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub parameters: IndexMap<String, TypeDescriptor>,
    #[serde(default)]
    pub returns: Option<TypeDescriptor>,
}

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("Invalid service definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No handler '{handler}' registered for function '{function}'")]
    MissingHandler { function: String, handler: String },
}

impl ServiceDefinition {
    pub fn from_json(source: &str) -> Result<Self, BindingError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Pair every function with its handler.
    ///
    /// Fails on the first function whose handler is not registered. Descriptor consistency is not
    /// checked here; that happens when the functions are exposed.
    pub fn bind(
        self,
        handlers: &HashMap<String, Arc<dyn ExternalFunction>>,
    ) -> Result<Vec<FunctionDescriptor>, BindingError> {
        self.functions
            .into_iter()
            .map(|definition| -> Result<FunctionDescriptor, BindingError> {
                let handler_name = definition
                    .handler
                    .clone()
                    .unwrap_or_else(|| definition.name.clone());

                let target = handlers.get(&handler_name).cloned().ok_or_else(|| {
                    BindingError::MissingHandler {
                        function: definition.name.clone(),
                        handler: handler_name,
                    }
                })?;

                Ok(FunctionDescriptor {
                    name: definition.name,
                    description: definition.description,
                    parameters: definition.parameters.into_iter().collect(),
                    returns: definition.returns,
                    target,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Requiredness;
    use crate::function::{CallArguments, ServiceError};
    use common::value::Val;
    use multiplatform_test::multiplatform_test;

    const DEFINITION: &str = r#"{
        "functions": [
            {
                "name": "get_course",
                "description": "Fetch one course",
                "parameters": {
                    "id": {"type": "scalar", "kind": "integer"},
                    "lang": {"type": "scalar", "kind": "text", "requiredness": {"default": "en"}}
                },
                "returns": {"type": "struct", "fields": {"fullname": {"type": "scalar", "kind": "text"}}}
            },
            {
                "name": "ping",
                "handler": "system::ping"
            }
        ]
    }"#;

    fn handler(_: &CallArguments) -> Result<Val, ServiceError> {
        Ok(Val::Null)
    }

    #[multiplatform_test]
    fn bind_to_handlers() {
        let definition = ServiceDefinition::from_json(DEFINITION).unwrap();

        let mut handlers: HashMap<String, Arc<dyn ExternalFunction>> = HashMap::new();
        handlers.insert("get_course".to_string(), Arc::new(handler));
        handlers.insert("system::ping".to_string(), Arc::new(handler));

        let functions = definition.bind(&handlers).unwrap();
        assert_eq!(functions.len(), 2);

        let get_course = &functions[0];
        assert_eq!(get_course.description, "Fetch one course");
        assert_eq!(
            get_course
                .parameters
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>(),
            vec!["id", "lang"]
        );
        assert_eq!(
            get_course.parameters[1].1.requiredness(),
            &Requiredness::Default(Val::from("en"))
        );
        assert!(get_course.returns.is_some());

        let ping = &functions[1];
        assert!(ping.parameters.is_empty());
        assert!(ping.returns.is_none());
    }

    #[multiplatform_test]
    fn missing_handler() {
        let definition = ServiceDefinition::from_json(DEFINITION).unwrap();

        let mut handlers: HashMap<String, Arc<dyn ExternalFunction>> = HashMap::new();
        handlers.insert("get_course".to_string(), Arc::new(handler));

        let err = definition.bind(&handlers).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No handler 'system::ping' registered for function 'ping'"
        );
    }

    #[multiplatform_test]
    fn malformed_definition() {
        let err = ServiceDefinition::from_json(r#"{"functions": [{"name": 3}]}"#).unwrap_err();
        assert!(matches!(err, BindingError::Parse(_)));
    }
}
