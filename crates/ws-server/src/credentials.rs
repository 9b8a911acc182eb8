// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use ws_resolver::escape_xml;

use crate::config::{AuthMethod, ServerConfig};

const USERNAME_PARAM: &str = "wsusername";
const PASSWORD_PARAM: &str = "wspassword";
const TOKEN_PARAM: &str = "wstoken";

/// Credentials supplied with a request. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    /// Read credentials from the query string, falling back to `/{username}/{password}` in the
    /// path info when either of the two is missing.
    ///
    /// Some clients mangle `&` in endpoint URIs, hence the path form.
    pub fn extract(query: &str, path_info: &str) -> Self {
        let mut credentials = Credentials::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match &*key {
                USERNAME_PARAM => credentials.username = Some(value.into_owned()),
                PASSWORD_PARAM => credentials.password = Some(value.into_owned()),
                TOKEN_PARAM => credentials.token = Some(value.into_owned()),
                _ => {}
            }
        }

        if credentials.username.is_none() || credentials.password.is_none() {
            if let Some((username, password)) = from_path(path_info) {
                credentials.username = Some(username);
                credentials.password = Some(password);
            }
        }

        credentials
    }
}

fn from_path(path_info: &str) -> Option<(String, String)> {
    let parts = path_info.trim_matches('/').split('/').collect::<Vec<_>>();

    match parts.as_slice() {
        [username, password] => {
            let username = urlencoding::decode(username).ok()?;
            let password = urlencoding::decode(password).ok()?;
            Some((username.into_owned(), password.into_owned()))
        }
        _ => None,
    }
}

/// The URI the transport engine embeds in its responses, already escaped for XML.
pub fn endpoint_uri(config: &ServerConfig, credentials: &Credentials) -> String {
    let uri = match config.auth_method {
        AuthMethod::Username => format!(
            "{}/{}/{}",
            config.endpoint_url,
            urlencoding::encode(credentials.username.as_deref().unwrap_or_default()),
            urlencoding::encode(credentials.password.as_deref().unwrap_or_default()),
        ),
        AuthMethod::Token => format!(
            "{}?{TOKEN_PARAM}={}",
            config.endpoint_url,
            urlencoding::encode(credentials.token.as_deref().unwrap_or_default()),
        ),
    };

    escape_xml(&uri)
}
