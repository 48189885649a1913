//! In-memory transport for tests.
//!
//! `MockTransport` records every request that is sent and keeps its
//! ready-state handler in a FIFO queue until the test decides how the request
//! ends. Clones share state, so a test can hand one clone to the code under
//! test and drive the exchange through another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpResponse};
use crate::transport::{ReadyStateHandler, Transport, TransportHandle};

/// A request as it was handed to `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RecordedRequest {
    /// First request header matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct MockState {
    sent: Vec<RecordedRequest>,
    in_flight: VecDeque<Option<ReadyStateHandler>>,
    fail_open: Option<String>,
    panic_open: Option<String>,
    fail_send: Option<String>,
    rejected_headers: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().sent.clone()
    }

    /// Number of sent requests that have not been finished by the test.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Make the next `open` return an error with `message`.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.lock().fail_open = Some(message.into());
    }

    /// Make the next `open` panic with `message`.
    pub fn panic_next_open(&self, message: impl Into<String>) {
        self.lock().panic_open = Some(message.into());
    }

    /// Make the next `send` return an error with `message`.
    pub fn fail_next_send(&self, message: impl Into<String>) {
        self.lock().fail_send = Some(message.into());
    }

    /// Reject any request header called `name` (case-insensitive).
    pub fn reject_header(&self, name: impl Into<String>) {
        self.lock().rejected_headers.push(name.into());
    }

    /// Deliver `snapshot` to the oldest in-flight request and keep it in
    /// flight. Returns `false` when nothing is in flight.
    pub fn notify(&self, snapshot: HttpResponse) -> bool {
        let handler = match self.lock().in_flight.front_mut() {
            Some(slot) => slot.take(),
            None => return false,
        };
        let Some(mut handler) = handler else {
            return false;
        };
        handler(&snapshot);
        if let Some(slot) = self.lock().in_flight.front_mut() {
            if slot.is_none() {
                *slot = Some(handler);
            }
        }
        true
    }

    /// Finish the oldest in-flight request with `snapshot` and drop its
    /// handler. Returns `false` when nothing is in flight.
    pub fn respond_with(&self, snapshot: HttpResponse) -> bool {
        let Some(handler) = self.lock().in_flight.pop_front() else {
            return false;
        };
        if let Some(mut handler) = handler {
            handler(&snapshot);
        }
        true
    }

    /// Finish the oldest in-flight request with an HTTP response.
    pub fn respond(&self, status: u16, body: impl Into<String>) -> bool {
        self.respond_with(HttpResponse::done(status, body))
    }

    /// Finish the oldest in-flight request as a connection failure.
    pub fn fail_connection(&self) -> bool {
        self.respond_with(HttpResponse::connection_failed())
    }

    /// Drop the oldest in-flight request's handler without ever reaching a
    /// terminal state.
    pub fn abandon(&self) -> bool {
        let handler = self.lock().in_flight.pop_front();
        handler.is_some()
    }
}

impl Transport for MockTransport {
    type Handle = MockHandle;

    fn open(&self, method: &HttpMethod, url: &str) -> Result<MockHandle, TransportError> {
        let (fail, panic_msg) = {
            let mut state = self.lock();
            (state.fail_open.take(), state.panic_open.take())
        };
        if let Some(msg) = panic_msg {
            panic!("{msg}");
        }
        if let Some(msg) = fail {
            return Err(msg.into());
        }
        Ok(MockHandle {
            transport: self.clone(),
            request: RecordedRequest {
                method: method.clone(),
                url: url.to_string(),
                headers: Vec::new(),
                body: None,
            },
            handler: None,
        })
    }
}

/// Handle produced by `MockTransport::open`.
pub struct MockHandle {
    transport: MockTransport,
    request: RecordedRequest,
    handler: Option<ReadyStateHandler>,
}

impl TransportHandle for MockHandle {
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let rejected = self
            .transport
            .lock()
            .rejected_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name));
        if rejected {
            return Err(format!("invalid header name: {name:?}").into());
        }
        self.request
            .headers
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn on_ready_state_change(&mut self, handler: ReadyStateHandler) {
        self.handler = Some(handler);
    }

    fn send(mut self, body: Option<String>) -> Result<(), TransportError> {
        let mut state = self.transport.lock();
        if let Some(msg) = state.fail_send.take() {
            return Err(msg.into());
        }
        self.request.body = body;
        state.sent.push(self.request);
        state.in_flight.push_back(self.handler.take());
        Ok(())
    }
}
