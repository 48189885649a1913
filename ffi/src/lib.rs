//! C-ABI wrapper around `xhr-core`.
//!
//! # Overview
//! Exposes the request dispatcher through `extern "C"` functions. A C caller
//! creates a transport, then passes a JSON config and a callback to
//! `xhr_dispatch`; the callback receives an `FfiOutcome` exactly once.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The config is the same JSON object `RequestConfig` deserializes from,
//!   so C callers do not need a struct per optional field.
//! - The callback may run on a worker thread. `user_data` is passed through
//!   untouched; the caller must make it safe to use from that thread.
//! - The library owns each `FfiOutcome` and frees it after the callback
//!   returns.

pub mod types;

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::debug;
use xhr_core::{dispatch, RequestConfig, UreqTransport};

use types::*;

/// Completion callback. `outcome` is only valid until the callback returns.
pub type XhrCallback = extern "C" fn(user_data: *mut c_void, outcome: *const FfiOutcome);

#[derive(Clone, Copy)]
struct UserData(*mut c_void);

// The pointer is opaque to us; thread-safety of what it points to is the
// caller's contract.
unsafe impl Send for UserData {}

fn deliver(callback: XhrCallback, user_data: UserData, outcome: FfiOutcome) {
    callback(user_data.0, &outcome);
}

// ---------------------------------------------------------------------------
// Transport lifecycle
// ---------------------------------------------------------------------------

/// Create a transport that performs requests over real HTTP.
///
/// Returns null if an internal panic occurs.
/// The caller must free the returned pointer with `xhr_transport_free`.
#[unsafe(no_mangle)]
pub extern "C" fn xhr_transport_new() -> *mut FfiTransport {
    catch_unwind(|| {
        let transport = FfiTransport {
            inner: UreqTransport::new(),
        };
        Box::into_raw(Box::new(transport))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a transport created by `xhr_transport_new`. Safe to call with null.
///
/// Requests already in flight keep running and still invoke their callbacks.
#[unsafe(no_mangle)]
pub extern "C" fn xhr_transport_free(transport: *mut FfiTransport) {
    if !transport.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(transport) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Send one request described by `config_json` and report the result to
/// `callback`.
///
/// `config_json` is a JSON object with `url` (required), `method`, `data`
/// and `headers` (all optional). The callback fires exactly once: before
/// this function returns for argument, config and setup errors, otherwise
/// from a worker thread when the request finishes. A null `callback` makes
/// the call a no-op.
#[unsafe(no_mangle)]
pub extern "C" fn xhr_dispatch(
    transport: *const FfiTransport,
    config_json: *const c_char,
    callback: Option<XhrCallback>,
    user_data: *mut c_void,
) {
    let Some(callback) = callback else {
        return;
    };
    let user_data = UserData(user_data);

    catch_unwind(AssertUnwindSafe(|| {
        if transport.is_null() {
            return deliver(
                callback,
                user_data,
                FfiOutcome::error(FfiErrorCode::NullArg, "null argument: transport"),
            );
        }
        if config_json.is_null() {
            return deliver(
                callback,
                user_data,
                FfiOutcome::error(FfiErrorCode::NullArg, "null argument: config_json"),
            );
        }
        let transport = unsafe { &*transport };
        let config = match parse_config(config_json) {
            Ok(config) => config,
            Err(msg) => {
                debug!("rejecting config: {msg}");
                return deliver(
                    callback,
                    user_data,
                    FfiOutcome::error(FfiErrorCode::InvalidConfig, &msg),
                );
            }
        };

        dispatch(&transport.inner, config, move |result| {
            deliver(callback, user_data, FfiOutcome::from_result(result));
        });
    }))
    .unwrap_or_else(|_| {
        deliver(
            callback,
            user_data,
            FfiOutcome::error(FfiErrorCode::Panic, "panic in xhr_dispatch"),
        )
    })
}

fn parse_config(config_json: *const c_char) -> Result<RequestConfig, String> {
    let raw = unsafe { CStr::from_ptr(config_json) }
        .to_str()
        .map_err(|e| format!("config is not valid UTF-8: {e}"))?;
    serde_json::from_str(raw).map_err(|e| format!("invalid config: {e}"))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Recorded {
        code: FfiErrorCode,
        message: Option<String>,
        has_handle: bool,
    }

    type Sink = Mutex<Vec<Recorded>>;

    extern "C" fn record(user_data: *mut c_void, outcome: *const FfiOutcome) {
        let sink = unsafe { &*(user_data as *const Sink) };
        let outcome = unsafe { &*outcome };
        let message = if outcome.error_message.is_null() {
            None
        } else {
            Some(
                unsafe { CStr::from_ptr(outcome.error_message) }
                    .to_str()
                    .unwrap()
                    .to_string(),
            )
        };
        sink.lock().unwrap().push(Recorded {
            code: outcome.error_code,
            message,
            has_handle: outcome.has_handle,
        });
    }

    /// Dispatch with a config that fails before any network activity and
    /// return what the callback saw.
    fn dispatch_sync(transport: *const FfiTransport, config: Option<&str>) -> Vec<Recorded> {
        let sink: Sink = Mutex::new(Vec::new());
        let config = config.map(|c| CString::new(c).unwrap());
        let config_ptr = config.as_ref().map_or(std::ptr::null(), |c| c.as_ptr());

        xhr_dispatch(
            transport,
            config_ptr,
            Some(record),
            &sink as *const Sink as *mut c_void,
        );
        sink.into_inner().unwrap()
    }

    #[test]
    fn transport_new_and_free() {
        let transport = xhr_transport_new();
        assert!(!transport.is_null());
        xhr_transport_free(transport);
    }

    #[test]
    fn transport_free_null_is_safe() {
        xhr_transport_free(std::ptr::null_mut());
    }

    #[test]
    fn null_transport_reports_null_arg() {
        let recorded = dispatch_sync(std::ptr::null(), Some(r#"{"url":"http://localhost/"}"#));
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, FfiErrorCode::NullArg);
        assert_eq!(recorded[0].message.as_deref(), Some("null argument: transport"));
    }

    #[test]
    fn null_config_reports_null_arg() {
        let transport = xhr_transport_new();
        let recorded = dispatch_sync(transport, None);
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, FfiErrorCode::NullArg);
        xhr_transport_free(transport);
    }

    #[test]
    fn null_callback_is_a_no_op() {
        let transport = xhr_transport_new();
        let config = CString::new(r#"{"url":"http://localhost/"}"#).unwrap();
        xhr_dispatch(transport, config.as_ptr(), None, std::ptr::null_mut());
        xhr_transport_free(transport);
    }

    #[test]
    fn malformed_json_reports_invalid_config() {
        let transport = xhr_transport_new();
        let recorded = dispatch_sync(transport, Some("{not json"));
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, FfiErrorCode::InvalidConfig);
        assert!(recorded[0].message.as_deref().unwrap().starts_with("invalid config"));
        xhr_transport_free(transport);
    }

    #[test]
    fn missing_url_reports_missing_url() {
        let transport = xhr_transport_new();
        let recorded = dispatch_sync(transport, Some(r#"{"method":"POST","data":"x"}"#));
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, FfiErrorCode::MissingUrl);
        assert!(!recorded[0].has_handle);
        xhr_transport_free(transport);
    }

    #[test]
    fn relative_url_reports_transport_error() {
        let transport = xhr_transport_new();
        let recorded = dispatch_sync(transport, Some(r#"{"url":"/echo"}"#));
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, FfiErrorCode::Transport);
        assert!(!recorded[0].has_handle);
        xhr_transport_free(transport);
    }

    #[test]
    fn invalid_header_reports_transport_error() {
        let transport = xhr_transport_new();
        let recorded = dispatch_sync(
            transport,
            Some(r#"{"url":"http://localhost/","headers":{"Bad Header":"x"}}"#),
        );
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, FfiErrorCode::Transport);
        xhr_transport_free(transport);
    }
}
