//! Callback-style HTTP request dispatcher.
//!
//! # Overview
//! `dispatch` takes a `RequestConfig` and a completion callback, sends one
//! request through an injected `Transport`, and invokes the callback exactly
//! once with either the raw response text or an error.
//!
//! # Design
//! - The config is loosely typed (every field optional, deserializable from
//!   JSON) and is validated once, in `RequestConfig::resolve`.
//! - The transport is a trait, so the real network (`UreqTransport`) and the
//!   in-memory double (`MockTransport`) are interchangeable.
//! - Failures never escape `dispatch`; they reach the callback as
//!   `Err(DispatchError)`. HTTP error statuses are not failures.
//! - `dispatch_future` wraps the same contract in a future.

mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mock;
pub mod transport;
#[cfg(feature = "ureq")]
pub mod ureq_transport;

pub use config::{Payload, RequestConfig};
pub use dispatch::{dispatch, dispatch_future, Outcome};
pub use error::{DispatchError, TransportError, NETWORK_ERROR_MESSAGE};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReadyState};
pub use mock::{MockTransport, RecordedRequest};
pub use transport::{ReadyStateHandler, Transport, TransportHandle};
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;
