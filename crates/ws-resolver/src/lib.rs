// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Schema-driven adapter between remote callers and the functions they invoke.
//!
//! Values are cast against type descriptors on the way in and on the way out ([`cast`]),
//! functions are turned into callable methods with generated type names ([`AdapterRegistry`]),
//! and failures are turned into wire faults ([`FaultTranslator`]).

pub mod cast;
pub mod error;
pub mod exposure;
pub mod fault;
pub mod naming;
pub mod registry;

pub use cast::{CastOptions, UnknownFieldPolicy, cast, cast_with};
pub use error::{CallError, ConfigurationError, PathSegment, ValidationError};
pub use exposure::{
    ComplexField, ComplexShape, ComplexType, ExposedMethod, ExposedParameter, ExposedReturn,
    ExposureContext, ParameterDefault, TypeRef,
};
pub use fault::{EngineUnavailable, Fault, FaultCode, FaultTranslator, ParseFailure, escape_xml};
pub use naming::{FieldPath, NameAllocator};
pub use registry::{AdapterRegistry, RegistryBuild};
