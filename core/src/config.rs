//! Caller-facing request configuration.
//!
//! # Design
//! `RequestConfig` mirrors the loosely-typed options object callers used to
//! pass around: every field is optional at the type level so a config can be
//! deserialized from arbitrary JSON. `resolve` is the single place where the
//! required `url` is checked and the defaults are applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::http::{HttpMethod, HttpRequest};

/// Request body as supplied by the caller.
///
/// Text is sent as-is. Any other JSON value is sent as its string form:
/// numbers and booleans as displayed, arrays and objects as compact JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
}

impl Payload {
    /// String form of the payload, or `None` when it is empty, `null`,
    /// `false` or zero. Such payloads count as "no body".
    pub fn to_body(&self) -> Option<String> {
        match self {
            Payload::Text(text) if text.is_empty() => None,
            Payload::Text(text) => Some(text.clone()),
            Payload::Json(value) => json_body(value),
        }
    }
}

fn json_body(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

/// Options for one request.
///
/// Defaults: `method = "GET"`, no `data`, no `headers`. `url` has no default;
/// resolving a config without one fails with `DispatchError::MissingUrl`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Validate the config and fill in every default.
    pub fn resolve(self) -> Result<HttpRequest, DispatchError> {
        let url = self.url.ok_or(DispatchError::MissingUrl)?;
        let method = self
            .method
            .as_deref()
            .map(HttpMethod::parse)
            .unwrap_or_default();
        let body = self.data.as_ref().and_then(Payload::to_body);
        let headers = self.headers.unwrap_or_default().into_iter().collect();

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}
