//! The request dispatcher.
//!
//! # Design
//! `dispatch` never returns an error and never lets a transport panic escape.
//! Every outcome, including validation and setup failures, reaches the caller
//! through the callback, and the callback runs exactly once per call:
//!
//! | result                         | error | body | handle |
//! |--------------------------------|-------|------|--------|
//! | `Err(MissingUrl)`              | yes   | no   | no     |
//! | `Err(Transport / Panicked)`    | yes   | no   | no     |
//! | `Err(Abandoned)`               | yes   | no   | no     |
//! | `Err(Network(handle))`         | yes   | no   | yes    |
//! | `Ok(Outcome { body, handle })` | no    | yes  | yes    |
//!
//! HTTP error statuses are not errors here. A 404 is a completed request and
//! arrives as `Ok`; callers inspect `handle.status` themselves.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::channel::oneshot;
use log::{debug, trace};

use crate::completion::{Completion, DispatchResult, HandlerGuard};
use crate::config::RequestConfig;
use crate::error::DispatchError;
use crate::http::HttpResponse;
use crate::transport::{Transport, TransportHandle};

/// A request that completed at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Raw response text.
    pub body: String,
    /// Final snapshot of the transport handle (status, response headers).
    pub handle: HttpResponse,
}

/// Send one request described by `config` through `transport`.
///
/// Returns as soon as the request is on its way. `callback` is invoked
/// exactly once: synchronously if the config is invalid or the transport
/// rejects the request, otherwise from the transport's notification context
/// when the handle reaches its terminal state.
pub fn dispatch<T, F>(transport: &T, config: RequestConfig, callback: F)
where
    T: Transport + ?Sized,
    F: FnOnce(Result<Outcome, DispatchError>) + Send + 'static,
{
    let completion = Completion::new(callback);

    let started = panic::catch_unwind(AssertUnwindSafe(|| start(transport, config, &completion)))
        .unwrap_or_else(|payload| Err(DispatchError::Panicked(panic_message(payload))));

    match started {
        Ok(()) => completion.finish_setup(),
        Err(err) => {
            debug!("request failed before it was sent: {err}");
            completion.resolve(Err(err));
        }
    }
}

/// Like `dispatch`, but hands the result back as a future.
///
/// The request is started immediately, not when the future is first polled.
pub fn dispatch_future<T>(
    transport: &T,
    config: RequestConfig,
) -> impl Future<Output = Result<Outcome, DispatchError>>
where
    T: Transport + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    dispatch(transport, config, move |result| {
        // The receiver may already be gone; nobody is waiting then.
        let _ = tx.send(result);
    });
    async move { rx.await.unwrap_or(Err(DispatchError::Abandoned)) }
}

fn start<T, F>(
    transport: &T,
    config: RequestConfig,
    completion: &Arc<Completion<F>>,
) -> Result<(), DispatchError>
where
    T: Transport + ?Sized,
    F: FnOnce(DispatchResult) + Send + 'static,
{
    let request = config.resolve()?;
    debug!("dispatching {} {}", request.method, request.url);

    let mut handle = transport
        .open(&request.method, &request.url)
        .map_err(DispatchError::Transport)?;

    for (name, value) in &request.headers {
        handle
            .set_request_header(name, value)
            .map_err(DispatchError::Transport)?;
    }

    let guard = HandlerGuard::new(completion);
    handle.on_ready_state_change(Box::new(move |snapshot: &HttpResponse| {
        trace!("ready state {:?}, status {}", snapshot.ready_state, snapshot.status);
        if snapshot.ready_state.is_terminal() {
            guard.resolve(complete(snapshot));
        }
    }));

    handle.send(request.body).map_err(DispatchError::Transport)
}

/// Classify a terminal snapshot.
fn complete(snapshot: &HttpResponse) -> DispatchResult {
    if snapshot.status == 0 {
        debug!("request finished without a response");
        return Err(DispatchError::Network(snapshot.clone()));
    }
    debug!("request finished with status {}", snapshot.status);
    Ok(Outcome {
        body: snapshot.body.clone(),
        handle: snapshot.clone(),
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
