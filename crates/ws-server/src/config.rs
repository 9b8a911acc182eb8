// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::env::{
    EnvError, Environment, SystemEnvironment, WS_AUTH_METHOD, diagnostics_enabled,
    get_endpoint_url, strict_structs_enabled,
};
use ws_resolver::CastOptions;

/// How callers identify themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    #[default]
    Token,
    Username,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub diagnostics: bool,
    pub auth_method: AuthMethod,
    /// Without a trailing slash.
    pub endpoint_url: String,
    pub cast_options: CastOptions,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_process_env() -> Result<Self, EnvError> {
        Self::from_env(&SystemEnvironment)
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        let auth_method = match env.get(WS_AUTH_METHOD) {
            None => AuthMethod::default(),
            Some(value) => match value.to_lowercase().as_str() {
                "token" => AuthMethod::Token,
                "username" => AuthMethod::Username,
                _ => {
                    return Err(EnvError::InvalidEnum {
                        env_key: WS_AUTH_METHOD,
                        env_value: value,
                        message: "Must be one of 'token' or 'username'".to_string(),
                    });
                }
            },
        };

        let cast_options = if strict_structs_enabled(env)? {
            CastOptions::strict()
        } else {
            CastOptions::default()
        };

        Ok(Self {
            diagnostics: diagnostics_enabled(env)?,
            auth_method,
            endpoint_url: get_endpoint_url(env),
            cast_options,
        })
    }
}
