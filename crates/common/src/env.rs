// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Deployment configuration read from environment variables.
//!
//! Components never call `std::env` directly; they receive a `&dyn Environment` so tests can
//! supply a [`MapEnvironment`].

use std::collections::HashMap;
use std::sync::Arc;

/// Include debug detail in outbound faults (off by default).
pub const WS_DIAGNOSTICS: &str = "WS_DIAGNOSTICS";
/// Reject unknown struct keys instead of discarding them (off by default).
pub const WS_STRICT_STRUCTS: &str = "WS_STRICT_STRUCTS";
/// `token` (default) or `username`.
pub const WS_AUTH_METHOD: &str = "WS_AUTH_METHOD";
/// Base URL of the service endpoint, used to build the URI handed to the transport engine.
pub const WS_ENDPOINT_URL: &str = "WS_ENDPOINT_URL";
/// Log filter, following the `RUST_LOG` conventions.
pub const WS_LOG: &str = "WS_LOG";

const DEFAULT_ENDPOINT_URL: &str = "http://localhost/webservice/soap/server";

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" | "enable" => Ok(true),
                "false" | "0" | "no" | "off" | "disabled" | "disable" => Ok(false),
                _ => Err(EnvError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }

    fn get_or_else(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or(default_value.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error(
        "Invalid value for {key}: {value}. Expected true, 1, yes, on, enabled, enable OR false, 0, no, off, disabled, disable"
    )]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid env value {env_value} for {env_key}: {message}")]
    InvalidEnum {
        env_key: &'static str,
        env_value: String,
        message: String,
    },
}

pub fn diagnostics_enabled(env: &dyn Environment) -> Result<bool, EnvError> {
    env.enabled(WS_DIAGNOSTICS, false)
}

pub fn strict_structs_enabled(env: &dyn Environment) -> Result<bool, EnvError> {
    env.enabled(WS_STRICT_STRUCTS, false)
}

pub fn get_endpoint_url(env: &dyn Environment) -> String {
    let url = env.get_or_else(WS_ENDPOINT_URL, DEFAULT_ENDPOINT_URL);
    url.trim_end_matches('/').to_string()
}

/// The process environment.
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Default)]
pub struct MapEnvironment {
    values: HashMap<String, String>,
    fallback: Option<Arc<dyn Environment>>,
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| self.fallback.as_ref().and_then(|fb| fb.get(key)))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(values: [(&str, &str); N]) -> Self {
        Self {
            values: HashMap::from_iter(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
            fallback: None,
        }
    }
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_fallback(fallback: Arc<dyn Environment>) -> Self {
        Self {
            values: HashMap::new(),
            fallback: Some(fallback),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}
