// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Request handling for the web service endpoint.
//!
//! The server owns the adapter registry and drives one request at a time through credential
//! extraction, authentication, the transport engine and the registry. Envelope encoding and
//! authentication policy are supplied by the embedding application through the traits in
//! [`engine`].

pub mod config;
pub mod credentials;
pub mod engine;
pub mod server;

pub use config::{AuthMethod, ServerConfig};
pub use credentials::{Credentials, endpoint_uri};
pub use engine::{
    AuthenticationError, Authenticator, DecodedCall, EngineFactory, TransportEngine,
};
pub use server::{CONTENT_TYPE, IncomingRequest, OutgoingResponse, SoapServer};

use std::sync::Arc;

use common::env::EnvError;
use common::logging_tracing::{self, LoggingError};
use thiserror::Error;
use ws_model::FunctionDescriptor;
use ws_resolver::ExposureContext;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Config(#[from] EnvError),
}

/// Initialize the server by:
/// - Initializing tracing
/// - Reading the [`ServerConfig`] from the process environment
/// - Exposing `functions` (and return the server)
///
/// Call once per process; a second call fails because the tracing subscriber is already
/// installed.
pub fn init(
    functions: impl IntoIterator<Item = FunctionDescriptor>,
    context: &ExposureContext,
    engines: Arc<dyn EngineFactory>,
    authenticator: Arc<dyn Authenticator>,
) -> Result<SoapServer, InitError> {
    logging_tracing::init()?;

    let config = ServerConfig::from_process_env()?;

    Ok(SoapServer::new(
        functions,
        context,
        config,
        engines,
        authenticator,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::value::Val;
    use ws_model::{CallArguments, ServiceError};
    use ws_resolver::EngineUnavailable;

    struct NoEngine;

    impl EngineFactory for NoEngine {
        fn create(&self, _: &str) -> Result<Box<dyn TransportEngine>, EngineUnavailable> {
            Err(EngineUnavailable::new("Engine down"))
        }
    }

    struct AllowAll;

    impl Authenticator for AllowAll {
        fn authenticate(&self, _: AuthMethod, _: &Credentials) -> Result<(), AuthenticationError> {
            Ok(())
        }
    }

    fn ping() -> FunctionDescriptor {
        FunctionDescriptor::new(
            "ping",
            Arc::new(|_: &CallArguments| -> Result<Val, ServiceError> { Ok(Val::Null) }),
        )
    }

    #[test]
    fn init_once() {
        let server = init(
            [ping()],
            &ExposureContext::default(),
            Arc::new(NoEngine),
            Arc::new(AllowAll),
        )
        .unwrap();
        assert!(server.registry().method("ping").is_some());

        let again = init(
            [ping()],
            &ExposureContext::default(),
            Arc::new(NoEngine),
            Arc::new(AllowAll),
        );
        assert!(matches!(again, Err(InitError::Logging(_))));
    }
}
