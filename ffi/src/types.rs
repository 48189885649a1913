//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! `FfiOutcome` flattens `Result<Outcome, DispatchError>` into one C struct:
//! an error code plus the raw handle fields. The library allocates every
//! string in it and frees them when the outcome is dropped, right after the
//! C callback returns, so C callers copy out whatever they want to keep.

use std::ffi::CString;
use std::os::raw::c_char;

use xhr_core::{DispatchError, HttpResponse, Outcome, UreqTransport};

/// Opaque handle to a transport. C callers receive a pointer to this and
/// pass it to every `xhr_dispatch` call.
pub struct FfiTransport {
    pub(crate) inner: UreqTransport,
}

/// Error codes reported in `FfiOutcome`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// The config JSON had no `url`.
    MissingUrl = 1,
    /// The config was not valid UTF-8 or not a JSON config object.
    InvalidConfig = 2,
    /// The transport rejected the request during setup.
    Transport = 3,
    /// The request never got a response (status 0).
    Network = 4,
    /// The transport gave up on the request without finishing it.
    Abandoned = 5,
    Panic = 6,
    NullArg = 7,
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Result of one dispatch, handed to the C callback.
///
/// `error_code == Ok`: `body` holds the response text and the handle fields
/// are set. `error_code == Network`: `error_message` is set and the handle
/// fields are set (`status == 0`). Any other code: only `error_message` is
/// set and `has_handle` is false.
#[repr(C)]
pub struct FfiOutcome {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub has_handle: bool,
    pub ready_state: u8,
    pub status: u16,
    pub status_text: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut c_char,
}

impl FfiOutcome {
    fn empty(error_code: FfiErrorCode) -> Self {
        FfiOutcome {
            error_code,
            error_message: std::ptr::null_mut(),
            has_handle: false,
            ready_state: 0,
            status: 0,
            status_text: std::ptr::null_mut(),
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
        }
    }

    /// An error outcome with no handle.
    pub(crate) fn error(error_code: FfiErrorCode, message: &str) -> Self {
        let mut outcome = Self::empty(error_code);
        outcome.error_message = c_string(message);
        outcome
    }

    pub(crate) fn from_result(result: Result<Outcome, DispatchError>) -> Self {
        match result {
            Ok(Outcome { body, handle }) => {
                let mut outcome = Self::empty(FfiErrorCode::Ok).with_handle(handle);
                outcome.body = c_string(&body);
                outcome
            }
            Err(err) => {
                let code = match &err {
                    DispatchError::MissingUrl => FfiErrorCode::MissingUrl,
                    DispatchError::Transport(_) => FfiErrorCode::Transport,
                    DispatchError::Panicked(_) => FfiErrorCode::Panic,
                    DispatchError::Network(_) => FfiErrorCode::Network,
                    DispatchError::Abandoned => FfiErrorCode::Abandoned,
                };
                let mut outcome = Self::error(code, &err.to_string());
                if let DispatchError::Network(handle) = err {
                    outcome = outcome.with_handle(handle);
                }
                outcome
            }
        }
    }

    fn with_handle(mut self, handle: HttpResponse) -> Self {
        self.has_handle = true;
        self.ready_state = handle.ready_state as u8;
        self.status = handle.status;
        self.status_text = c_string(&handle.status_text);
        self.headers_len = handle.headers.len();
        self.headers = if handle.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = handle
                .headers
                .iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };
        self
    }
}

impl Drop for FfiOutcome {
    fn drop(&mut self) {
        free_c_string(self.error_message);
        free_c_string(self.status_text);
        free_c_string(self.body);
        if !self.headers.is_null() && self.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.headers,
                    self.headers_len,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

/// Copy `s` into a heap C string. Interior NUL bytes are dropped.
fn c_string(s: &str) -> *mut c_char {
    let cleaned = if s.contains('\0') {
        s.replace('\0', "")
    } else {
        s.to_string()
    };
    CString::new(cleaned).unwrap_or_default().into_raw()
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
