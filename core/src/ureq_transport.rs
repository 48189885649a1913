//! Real HTTP transport backed by `ureq`.
//!
//! # Design
//! Everything that can be checked without the network (method token, URL,
//! header names and values) is checked while the handle is being set up, so
//! those mistakes surface as setup errors. `send` then moves the prepared
//! request onto its own worker thread and returns. The agent is configured
//! not to turn 4xx/5xx into errors; only failures to get a response at all
//! (DNS, refused connection) end in status 0. Once the status line has
//! arrived the terminal snapshot keeps it, even if the body breaks off.

use std::thread;

use log::{debug, warn};
use ureq::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use ureq::Agent;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpResponse, ReadyState};
use crate::transport::{ReadyStateHandler, Transport, TransportHandle};

/// Transport that performs each request on a dedicated thread.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Use a caller-configured agent. It should have `http_status_as_error`
    /// disabled, otherwise HTTP error statuses are reported as status 0.
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    type Handle = UreqHandle;

    fn open(&self, method: &HttpMethod, url: &str) -> Result<UreqHandle, TransportError> {
        let method = Method::from_bytes(method.as_str().as_bytes())?;
        let uri: Uri = url.parse()?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(format!("URL must be absolute: {url:?}").into());
        }
        Ok(UreqHandle {
            agent: self.agent.clone(),
            method,
            uri,
            headers: HeaderMap::new(),
            handler: None,
        })
    }
}

/// Handle produced by `UreqTransport::open`.
pub struct UreqHandle {
    agent: Agent,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    handler: Option<ReadyStateHandler>,
}

enum Prepared {
    WithBody(Request<String>),
    Empty(Request<()>),
}

impl TransportHandle for UreqHandle {
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.append(name, value);
        Ok(())
    }

    fn on_ready_state_change(&mut self, handler: ReadyStateHandler) {
        self.handler = Some(handler);
    }

    fn send(self, body: Option<String>) -> Result<(), TransportError> {
        let UreqHandle {
            agent,
            method,
            uri,
            headers,
            mut handler,
        } = self;

        // Like a browser, never send a body with GET or HEAD.
        let body = body.filter(|_| method != Method::GET && method != Method::HEAD);
        let builder = Request::builder().method(method).uri(uri);
        let prepared = match body {
            Some(body) => {
                let mut request = builder.body(body)?;
                *request.headers_mut() = headers;
                Prepared::WithBody(request)
            }
            None => {
                let mut request = builder.body(())?;
                *request.headers_mut() = headers;
                Prepared::Empty(request)
            }
        };

        thread::Builder::new()
            .name("xhr-request".to_string())
            .spawn(move || {
                perform(&agent, prepared, |snapshot| {
                    if let Some(handler) = handler.as_mut() {
                        handler(snapshot);
                    }
                })
            })?;
        Ok(())
    }
}

fn perform(agent: &Agent, request: Prepared, mut notify: impl FnMut(&HttpResponse)) {
    let result = match request {
        Prepared::WithBody(request) => agent.run(request),
        Prepared::Empty(request) => agent.run(request),
    };

    let mut response = match result {
        Ok(response) => response,
        Err(err) => {
            debug!("no response: {err}");
            notify(&HttpResponse::connection_failed());
            return;
        }
    };

    let status = response.status();
    let mut snapshot = HttpResponse {
        ready_state: ReadyState::HeadersReceived,
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers: response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::new(),
    };
    notify(&snapshot);

    // No size cap: the caller gets the whole body or nothing.
    match response.body_mut().with_config().limit(u64::MAX).read_to_vec() {
        Ok(body) => snapshot.body = String::from_utf8_lossy(&body).into_owned(),
        Err(err) => warn!("response body could not be read: {err}"),
    }
    snapshot.ready_state = ReadyState::Done;
    notify(&snapshot);
}
