// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use tracing::{debug, error, instrument};
use ws_model::FunctionDescriptor;
use ws_resolver::{
    AdapterRegistry, ConfigurationError, EngineUnavailable, ExposureContext, FaultTranslator,
    RegistryBuild,
};

use crate::config::ServerConfig;
use crate::credentials::{Credentials, endpoint_uri};
use crate::engine::{Authenticator, EngineFactory};

pub const CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingRequest {
    /// Raw query string, without the leading `?`.
    pub query: String,
    pub path_info: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub body: String,
    pub content_type: &'static str,
}

impl OutgoingResponse {
    fn xml(body: String) -> Self {
        Self {
            body,
            content_type: CONTENT_TYPE,
        }
    }
}

pub struct SoapServer {
    config: ServerConfig,
    registry: AdapterRegistry,
    rejected: Vec<ConfigurationError>,
    translator: FaultTranslator,
    engines: Arc<dyn EngineFactory>,
    authenticator: Arc<dyn Authenticator>,
}

impl SoapServer {
    /// Expose `functions` once, up front. Functions with inconsistent descriptors are left out
    /// and reported through [`SoapServer::rejected`].
    pub fn new(
        functions: impl IntoIterator<Item = FunctionDescriptor>,
        context: &ExposureContext,
        config: ServerConfig,
        engines: Arc<dyn EngineFactory>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let RegistryBuild { registry, rejected } =
            AdapterRegistry::build(functions, context, config.cast_options);

        Self {
            translator: FaultTranslator::new(config.diagnostics),
            config,
            registry,
            rejected,
            engines,
            authenticator,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn rejected(&self) -> &[ConfigurationError] {
        &self.rejected
    }

    /// Every outcome, failures included, is a well-formed XML body.
    #[instrument(skip_all)]
    pub fn handle(&self, request: &IncomingRequest) -> OutgoingResponse {
        let body = self.process(request).unwrap_or_else(|failure| {
            error!(%failure, "Could not process request");
            self.translator.engine_unavailable(&failure)
        });

        OutgoingResponse::xml(body)
    }

    fn process(&self, request: &IncomingRequest) -> Result<String, EngineUnavailable> {
        let credentials = Credentials::extract(&request.query, &request.path_info);
        self.authenticator
            .authenticate(self.config.auth_method, &credentials)?;

        let engine = self
            .engines
            .create(&endpoint_uri(&self.config, &credentials))?;

        let call = match engine.decode_call(&request.body) {
            Ok(call) => call,
            Err(failure) => {
                debug!(%failure, "Malformed request");
                return Ok(engine.encode_fault(&self.translator.parse_failure(&failure)));
            }
        };

        let body = match self.registry.call(&call.method, &call.arguments) {
            Ok(result) => engine.encode_result(&call.method, result.as_ref()),
            Err(error) => {
                debug!(method = %call.method, %error, "Call failed");
                engine.encode_fault(&self.translator.call_failure(&error))
            }
        };

        Ok(body)
    }
}
