//! # Error Context
//!
//! Structured context attached to entries in `errors.log`, plus helpers that
//! render an error and its source chain into a single log line.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::error::Error;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Error context information for better debugging
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub route_path: Option<String>,
    pub method: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
    pub additional_fields: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route_path: impl Into<String>) -> Self {
        self.route_path = Some(route_path.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_client_info(
        mut self,
        client_ip: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        self.client_ip = Some(client_ip.into());
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_fields.insert(key.into(), value.into());
        self
    }

    /// Serialize context to a single-line JSON object; empty context is `{}`
    pub fn to_json(&self) -> String {
        let mut context = Map::new();

        if let Some(ref route_path) = self.route_path {
            context.insert("route_path".into(), json!(route_path));
        }
        if let Some(ref method) = self.method {
            context.insert("method".into(), json!(method));
        }
        if let Some(ref client_ip) = self.client_ip {
            context.insert("client_ip".into(), json!(client_ip));
        }
        if let Some(ref user_agent) = self.user_agent {
            context.insert("user_agent".into(), json!(user_agent));
        }
        if let Some(ref request_id) = self.request_id {
            context.insert("request_id".into(), json!(request_id));
        }

        for (key, value) in &self.additional_fields {
            context.insert(key.clone(), json!(value));
        }

        Value::Object(context).to_string()
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Render the chain of `source()` errors below `error`, joined with ` <- `.
/// Returns `None` when the error has no source.
pub fn source_chain(error: &(dyn Error + 'static)) -> Option<String> {
    let mut causes = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        causes.push(single_line(&cause.to_string()));
        current = cause.source();
    }

    if causes.is_empty() {
        None
    } else {
        Some(causes.join(" <- "))
    }
}

/// Collapse line breaks so a value cannot split a log line
pub fn single_line(value: &str) -> String {
    if value.contains(['\n', '\r']) {
        value
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        value.to_string()
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
