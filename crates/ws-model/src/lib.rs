// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Model of the functions exposed over the web service.
//!
//! - [`descriptor`]: the recursive type descriptors (scalar, struct, list)
//! - [`function`]: function descriptors and the callables behind them
//! - [`definition`]: loading function descriptors from a JSON service definition

pub mod definition;
pub mod descriptor;
pub mod function;

pub use definition::{BindingError, FunctionDefinition, ServiceDefinition};
pub use descriptor::{
    ListDescriptor, Requiredness, ScalarDescriptor, ScalarKind, StructDescriptor, TypeDescriptor,
};
pub use function::{CallArguments, ExternalFunction, FunctionDescriptor, ServiceError};
