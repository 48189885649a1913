//! Error types reported through the dispatch callback.
//!
//! # Design
//! Nothing here is ever returned from `dispatch` itself; every variant is
//! delivered to the completion callback. Setup failures forward the
//! transport's own error value untouched so callers can downcast it.
//! `Network` is the only variant that carries the raw handle, since the
//! transport did reach a terminal state.

use std::fmt;

use crate::http::HttpResponse;

/// Error raised by a transport while opening, configuring, or sending a
/// handle. Kept opaque so each transport can surface its native error type.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message used for the status-0 network failure.
pub const NETWORK_ERROR_MESSAGE: &str = "Error sending request. Status 0.";

/// Everything that can go wrong with a single dispatch.
#[derive(Debug)]
pub enum DispatchError {
    /// The config had no `url`. No transport handle was created.
    MissingUrl,

    /// The transport rejected the request while it was being set up
    /// (bad URL, bad method, bad header, spawn failure, ...).
    Transport(TransportError),

    /// The transport panicked while the request was being set up.
    Panicked(String),

    /// The handle reached its terminal state with status 0: the request
    /// never got a response.
    Network(HttpResponse),

    /// The transport released the completion handler without ever reaching
    /// a terminal state.
    Abandoned,
}

impl DispatchError {
    /// The raw transport handle, when the failure happened after the
    /// request completed at the transport level.
    pub fn handle(&self) -> Option<&HttpResponse> {
        match self {
            DispatchError::Network(handle) => Some(handle),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MissingUrl => write!(f, "Missing required option: url"),
            DispatchError::Transport(err) => write!(f, "{err}"),
            DispatchError::Panicked(msg) => write!(f, "transport panicked: {msg}"),
            DispatchError::Network(_) => f.write_str(NETWORK_ERROR_MESSAGE),
            DispatchError::Abandoned => {
                write!(f, "transport dropped the request before it completed")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Transport(err) => Some(&**err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn network_error_uses_fixed_message() {
        let err = DispatchError::Network(HttpResponse::connection_failed());
        assert_eq!(err.to_string(), "Error sending request. Status 0.");
        assert_eq!(err.handle().map(|h| h.status), Some(0));
    }

    #[test]
    fn transport_error_is_forwarded_verbatim() {
        let err = DispatchError::Transport("invalid header name: \"bad header\"".into());
        assert_eq!(err.to_string(), "invalid header name: \"bad header\"");
        assert!(err.source().is_some());
        assert!(err.handle().is_none());
    }

    #[test]
    fn setup_errors_carry_no_handle() {
        assert!(DispatchError::MissingUrl.handle().is_none());
        assert!(DispatchError::Abandoned.handle().is_none());
        assert!(DispatchError::Panicked("boom".into()).handle().is_none());
    }
}
