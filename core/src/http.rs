//! HTTP data types shared by the dispatcher and its transports.
//!
//! # Design
//! Requests and responses are plain data. The dispatcher resolves a
//! `RequestConfig` into an `HttpRequest`, hands its pieces to a transport, and
//! receives `HttpResponse` snapshots back from the transport's ready-state
//! notifications. The final snapshot is the "raw handle" passed to callers so
//! they can inspect status and response headers themselves.
//!
//! All fields use owned types (`String`, `Vec`) so values can move across
//! worker threads and FFI boundaries without lifetime concerns.

use std::fmt;

/// HTTP method for a request.
///
/// DELETE, GET, HEAD, OPTIONS, POST and PUT are recognised case-insensitively
/// and normalised to upper case. `PATCH` only matches exactly; any other token
/// (including `patch`) is kept verbatim in `Other`. Whether it is acceptable
/// is up to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl HttpMethod {
    /// Parse a method token. An empty token resolves to `Get`.
    pub fn parse(token: &str) -> Self {
        if token == "PATCH" {
            return HttpMethod::Patch;
        }
        match token.to_ascii_uppercase().as_str() {
            "" | "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(token) => token,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request: every optional config field has its default.
///
/// Built by `RequestConfig::resolve`. Headers are applied to the transport
/// handle in the order they appear here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Progress of a transport handle through one request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    /// Terminal: the response is complete or the connection failed.
    Done = 4,
}

impl ReadyState {
    pub fn is_terminal(self) -> bool {
        self == ReadyState::Done
    }
}

/// Snapshot of a transport handle, reported on every ready-state change.
///
/// When `ready_state` is `Done`, `status == 0` means the request never got a
/// response (DNS failure, refused connection, aborted read, ...). Any other
/// status is an HTTP response, including 4xx and 5xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A handle that has been opened but has not received anything yet.
    pub fn opened() -> Self {
        Self {
            ready_state: ReadyState::Opened,
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Terminal snapshot with a real HTTP status.
    pub fn done(status: u16, body: impl Into<String>) -> Self {
        Self {
            ready_state: ReadyState::Done,
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Terminal snapshot for a request that never reached a server.
    pub fn connection_failed() -> Self {
        Self::done(0, String::new())
    }

    /// First response header matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_connection_failure(&self) -> bool {
        self.ready_state.is_terminal() && self.status == 0
    }
}
