//! Request-execution capability injected into the datasource.
//!
//! The datasource never talks to the network itself. It builds
//! [`HttpRequest`] values and hands them to a [`RequestExecutor`]; the host
//! (or [`reqwest_executor::ReqwestExecutor`] for the CLI) performs the call.

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub mod reqwest_executor;

/// Header carrying the backend tenant.
pub const TENANT_HEADER: &str = "Hawkular-Tenant";

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// HTTP method used by the datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

/// A backend request as described to the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL without query string.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Query string parameters.
    pub params: Vec<(String, String)>,
    /// JSON body for `POST` requests.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// A bare `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: None,
        }
    }

    /// A `POST` request with a JSON body.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: Some(body),
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response handed back by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body; non-JSON bodies arrive as a JSON string.
    pub body: Value,
}

impl HttpResponse {
    /// A response with the given status and body.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by request executors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP transport failure.
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Backend responded with an error status.
    #[error("backend returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitised response body.
        body: String,
    },
    /// URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Reject non-2xx responses, passing successful ones through.
///
/// # Errors
///
/// Returns `TransportError::HttpStatus` with a sanitised body on non-2xx.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, TransportError> {
    if response.is_success() {
        return Ok(response);
    }
    let raw = match &response.body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Err(TransportError::HttpStatus {
        status: response.status,
        body: sanitize_error_body(&raw),
    })
}

/// Collapse whitespace, redact bearer tokens, and cap length.
pub fn sanitize_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    if let Ok(regex) = Regex::new(r"(?i)bearer\s+[A-Za-z0-9._\-]{8,}") {
        sanitized = regex
            .replace_all(&sanitized, "Bearer [REDACTED]")
            .into_owned();
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Executes backend requests on behalf of the datasource.
///
/// Implementations return every response, whatever its status; status
/// policy belongs to the caller.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Perform `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request cannot be delivered.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
