//! The seam between the dispatcher and whatever actually performs HTTP.
//!
//! # Design
//! A `Transport` creates one `TransportHandle` per request. The handle is
//! configured (headers, one ready-state handler) and then consumed by `send`,
//! so it cannot be reused for a second exchange. `send` must return without
//! waiting for the response; progress is reported later through the handler,
//! from whatever thread or event loop the transport runs on.

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpResponse};

/// Callback registered on a handle. Invoked with a snapshot on every
/// ready-state change; the last call carries `ReadyState::Done`.
pub type ReadyStateHandler = Box<dyn FnMut(&HttpResponse) + Send + 'static>;

/// Factory for transport handles.
pub trait Transport {
    type Handle: TransportHandle;

    /// Create a handle bound to `method` and `url`, ready for asynchronous use.
    fn open(&self, method: &HttpMethod, url: &str) -> Result<Self::Handle, TransportError>;
}

/// One in-flight request/response exchange.
pub trait TransportHandle {
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// Register the ready-state handler. Registering again replaces it.
    fn on_ready_state_change(&mut self, handler: ReadyStateHandler);

    /// Start the request and return immediately.
    fn send(self, body: Option<String>) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    type Handle = T::Handle;

    fn open(&self, method: &HttpMethod, url: &str) -> Result<Self::Handle, TransportError> {
        (**self).open(method, url)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Handle = T::Handle;

    fn open(&self, method: &HttpMethod, url: &str) -> Result<Self::Handle, TransportError> {
        (**self).open(method, url)
    }
}
