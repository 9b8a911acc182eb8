// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Seams to the collaborators that own the wire format and the authentication policy.

use common::value::Val;
use thiserror::Error;
use ws_resolver::{EngineUnavailable, Fault, ParseFailure};

use crate::config::AuthMethod;
use crate::credentials::Credentials;

/// A call decoded from a request envelope. Arguments are positional.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    pub method: String,
    pub arguments: Vec<Val>,
}

/// Encodes and decodes envelopes for a single request.
pub trait TransportEngine {
    fn decode_call(&self, body: &str) -> Result<DecodedCall, ParseFailure>;

    /// `result` is `None` for void methods.
    fn encode_result(&self, method: &str, result: Option<&Val>) -> String;

    fn encode_fault(&self, fault: &Fault) -> String;
}

pub trait EngineFactory: Send + Sync {
    /// `endpoint_uri` is already XML-escaped.
    fn create(&self, endpoint_uri: &str) -> Result<Box<dyn TransportEngine>, EngineUnavailable>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthenticationError {
    pub message: String,
    pub debug_info: Option<String>,
}

impl AuthenticationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            debug_info: None,
        }
    }

    pub fn with_debug_info(mut self, debug_info: impl Into<String>) -> Self {
        self.debug_info = Some(debug_info.into());
        self
    }
}

impl From<AuthenticationError> for EngineUnavailable {
    fn from(error: AuthenticationError) -> Self {
        EngineUnavailable {
            message: error.message,
            debug_info: error.debug_info,
        }
    }
}

pub trait Authenticator: Send + Sync {
    fn authenticate(
        &self,
        method: AuthMethod,
        credentials: &Credentials,
    ) -> Result<(), AuthenticationError>;
}
