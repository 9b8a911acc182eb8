// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Translation of internal failures into wire-level faults.
//!
//! Debug detail (validation messages, service debug info) only reaches the wire when
//! diagnostics are enabled. The user-facing message and the error code always do.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::error::CallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultCode {
    Sender,
    Receiver,
}

impl FaultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCode::Sender => "Sender",
            FaultCode::Receiver => "Receiver",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub faultcode: FaultCode,
    pub faultstring: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faultactor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faultdetail: Option<String>,
}

/// The transport engine could not make sense of the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseFailure {
    pub message: String,
}

impl ParseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// No transport engine is available to encode a fault, so the fallback envelope is used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineUnavailable {
    pub message: String,
    pub debug_info: Option<String>,
}

impl EngineUnavailable {
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

#[derive(Debug, Clone, Copy, Default)]
pub struct FaultTranslator {
    diagnostics: bool,
}

impl FaultTranslator {
    pub fn new(diagnostics: bool) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    pub fn parse_failure(&self, failure: &ParseFailure) -> Fault {
        Fault {
            faultcode: FaultCode::Sender,
            faultstring: failure.message.clone(),
            faultactor: None,
            faultdetail: None,
        }
    }

    pub fn call_failure(&self, error: &CallError) -> Fault {
        let code = error.error_code();
        let debug_info = error.debug_info();

        if !self.diagnostics {
            if let Some(debug_info) = &debug_info {
                debug!(code, debug_info = %debug_info, "Withholding fault detail");
            }
        }

        Fault {
            faultcode: error.fault_code(),
            faultstring: format!("{} | ERRORCODE: {code}", error.message()),
            faultactor: Some(code.to_string()),
            faultdetail: if self.diagnostics { debug_info } else { None },
        }
    }

    /// The hand-built envelope returned when there is no engine to encode a fault with.
    pub fn engine_unavailable(&self, failure: &EngineUnavailable) -> String {
        let message = match (&failure.debug_info, self.diagnostics) {
            (Some(debug_info), true) => format!("{} - {debug_info}", failure.message),
            _ => failure.message.clone(),
        };

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Envelope><Body><Fault>\n<faultcode>ERROR</faultcode>\n<faultstring>{}</faultstring>\n</Fault></Body></Envelope>",
            escape_xml(&message)
        )
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use multiplatform_test::multiplatform_test;
    use ws_model::ServiceError;

    fn not_found() -> CallError {
        ServiceError::new("notfound", "Not found")
            .with_debug_info("row missing")
            .into()
    }

    #[multiplatform_test]
    fn diagnostics_gating() {
        let quiet = FaultTranslator::new(false).call_failure(&not_found());
        assert_eq!(
            quiet,
            Fault {
                faultcode: FaultCode::Receiver,
                faultstring: "Not found | ERRORCODE: notfound".to_string(),
                faultactor: Some("notfound".to_string()),
                faultdetail: None,
            }
        );

        let verbose = FaultTranslator::new(true).call_failure(&not_found());
        assert_eq!(verbose.faultdetail.as_deref(), Some("row missing"));
        assert_eq!(verbose.faultstring, quiet.faultstring);
        assert_eq!(verbose.faultactor, quiet.faultactor);
    }

    #[multiplatform_test]
    fn invalid_parameter_fault() {
        let error = CallError::InvalidParameter(
            ValidationError::MissingKey("name".to_string()).at_field("user"),
        );

        let fault = FaultTranslator::new(true).call_failure(&error);
        assert_eq!(fault.faultcode, FaultCode::Sender);
        assert_eq!(
            fault.faultstring,
            "Invalid parameter value detected | ERRORCODE: invalidparameter"
        );
        assert_eq!(
            fault.faultdetail.as_deref(),
            Some("user: Missing required key in single structure: name")
        );
    }

    #[multiplatform_test]
    fn parse_failure_has_no_actor() {
        let fault =
            FaultTranslator::new(true).parse_failure(&ParseFailure::new("Malformed envelope"));
        assert_eq!(fault.faultcode, FaultCode::Sender);
        assert_eq!(fault.faultstring, "Malformed envelope");
        assert_eq!(fault.faultactor, None);
        assert_eq!(fault.faultdetail, None);
    }

    #[multiplatform_test]
    fn engine_unavailable_envelope() {
        let failure = EngineUnavailable::new("Access denied").with_debug_info("token <expired>");

        assert_eq!(
            FaultTranslator::new(false).engine_unavailable(&failure),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Envelope><Body><Fault>\n<faultcode>ERROR</faultcode>\n<faultstring>Access denied</faultstring>\n</Fault></Body></Envelope>"
        );
        assert!(
            FaultTranslator::new(true)
                .engine_unavailable(&failure)
                .contains("<faultstring>Access denied - token &lt;expired&gt;</faultstring>")
        );
    }

    #[multiplatform_test]
    fn fault_serialization_skips_absent_fields() {
        let fault = FaultTranslator::default().parse_failure(&ParseFailure::new("bad"));
        assert_eq!(
            serde_json::to_string(&fault).unwrap(),
            r#"{"faultcode":"Sender","faultstring":"bad"}"#
        );
    }
}
