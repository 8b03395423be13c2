/*
 * lib.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sfoglia, a minimal web fetcher.
 *
 * Sfoglia is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sfoglia is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sfoglia.  If not, see <http://www.gnu.org/licenses/>.
 */

//! C FFI for sfoglia core. sfoglia_fetch returns a response (free with sfoglia_free_response)
//! or NULL with the reason available from sfoglia_last_error / sfoglia_last_error_kind.
//! All string parameters are UTF-8 NUL-terminated.

use libc::{c_char, c_int, size_t};
use std::ffi::{CStr, CString};
use std::ptr;
use sfoglia_core::{ErrorKind, FetchConfig, FetchError, Fetcher, HeaderMap};

/// Error kinds reported by sfoglia_last_error_kind. 0 means the last call succeeded.
pub const SFOGLIA_OK: c_int = 0;
pub const SFOGLIA_ERROR_UNSUPPORTED_SCHEME: c_int = 1;
pub const SFOGLIA_ERROR_MALFORMED_URL: c_int = 2;
pub const SFOGLIA_ERROR_CONNECTION: c_int = 3;
pub const SFOGLIA_ERROR_TLS_HANDSHAKE: c_int = 4;
pub const SFOGLIA_ERROR_PROTOCOL: c_int = 5;
pub const SFOGLIA_ERROR_HTTP: c_int = 6;
pub const SFOGLIA_ERROR_UNSUPPORTED_FRAMING: c_int = 7;
pub const SFOGLIA_ERROR_DECODING: c_int = 8;
pub const SFOGLIA_ERROR_MISSING_DECODER: c_int = 9;
/// Invalid argument (NULL or non-UTF-8 string, runtime could not start).
pub const SFOGLIA_ERROR_ARGUMENT: c_int = -1;

/// Hosts the shared tokio runtime for all fetches.
struct Registry {
    runtime: tokio::runtime::Runtime,
}

fn registry() -> Result<&'static Registry, std::io::Error> {
    static REGISTRY: once_cell::sync::OnceCell<Registry> = once_cell::sync::OnceCell::new();
    REGISTRY.get_or_try_init(|| {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        Ok(Registry { runtime })
    })
}

fn ptr_to_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string()) }
}

/// CString from arbitrary text; interior NULs truncate at the first one.
fn to_c_string(s: &str) -> CString {
    let end = s.find('\0').unwrap_or(s.len());
    CString::new(&s[..end]).unwrap_or_default()
}

thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<CString>> = const { std::cell::RefCell::new(None) };
    static LAST_ERROR_KIND: std::cell::Cell<c_int> = const { std::cell::Cell::new(SFOGLIA_OK) };
}

fn set_last_error(err: &FetchError) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(to_c_string(&err.to_string())));
    LAST_ERROR_KIND.with(|k| k.set(error_code(err.kind())));
}

fn set_argument_error(msg: &str) {
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(to_c_string(msg)));
    LAST_ERROR_KIND.with(|k| k.set(SFOGLIA_ERROR_ARGUMENT));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
    LAST_ERROR_KIND.with(|k| k.set(SFOGLIA_OK));
}

fn error_code(kind: ErrorKind) -> c_int {
    kind.code() as c_int
}

/// One response header. Names are lower-case.
#[repr(C)]
pub struct SfogliaHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// Successful fetch result. Caller frees with sfoglia_free_response.
/// body is NUL-terminated UTF-8; body_len excludes the terminator (the body may itself contain NULs).
#[repr(C)]
pub struct SfogliaResponse {
    pub header_count: size_t,
    pub headers: *mut SfogliaHeader,
    pub body: *mut c_char,
    pub body_len: size_t,
}

impl SfogliaResponse {
    fn from_parts(headers: &HeaderMap, body: String) -> Self {
        let headers: Box<[SfogliaHeader]> = headers
            .iter()
            .map(|(name, value)| SfogliaHeader {
                name: to_c_string(name).into_raw(),
                value: to_c_string(value).into_raw(),
            })
            .collect();
        let header_count = headers.len();
        let mut body = body.into_bytes();
        let body_len = body.len();
        body.push(0);
        Self {
            header_count,
            headers: Box::into_raw(headers) as *mut SfogliaHeader,
            body: Box::into_raw(body.into_boxed_slice()) as *mut c_char,
            body_len,
        }
    }
}

/// Version string (static, do not free).
#[no_mangle]
pub extern "C" fn sfoglia_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Fetch url (http, https or data) with the default configuration. Blocks until complete.
/// Returns a response (caller frees with sfoglia_free_response), or NULL on error.
#[no_mangle]
pub unsafe extern "C" fn sfoglia_fetch(url: *const c_char) -> *mut SfogliaResponse {
    fetch_with(url, FetchConfig::default())
}

/// As sfoglia_fetch, following at most max_redirects redirects.
#[no_mangle]
pub unsafe extern "C" fn sfoglia_fetch_with_redirects(
    url: *const c_char,
    max_redirects: u32,
) -> *mut SfogliaResponse {
    fetch_with(url, FetchConfig::default().max_redirects(max_redirects))
}

fn fetch_with(url: *const c_char, config: FetchConfig) -> *mut SfogliaResponse {
    let url = match ptr_to_str(url) {
        Some(s) => s,
        None => {
            set_argument_error("url is null or not valid UTF-8");
            return ptr::null_mut();
        }
    };
    let registry = match registry() {
        Ok(r) => r,
        Err(e) => {
            set_argument_error(&format!("cannot start runtime: {}", e));
            return ptr::null_mut();
        }
    };
    let fetcher = Fetcher::new(config);
    match registry.runtime.block_on(fetcher.fetch(&url)) {
        Ok((headers, body)) => {
            clear_last_error();
            Box::into_raw(Box::new(SfogliaResponse::from_parts(&headers, body)))
        }
        Err(e) => {
            set_last_error(&e);
            ptr::null_mut()
        }
    }
}

/// Value of the named header (case-insensitive), or NULL if absent.
/// Caller frees the returned string with sfoglia_free_string.
#[no_mangle]
pub unsafe extern "C" fn sfoglia_response_header(
    response: *const SfogliaResponse,
    name: *const c_char,
) -> *mut c_char {
    if response.is_null() {
        return ptr::null_mut();
    }
    let name = match ptr_to_str(name) {
        Some(s) => s.to_ascii_lowercase(),
        None => return ptr::null_mut(),
    };
    let response = &*response;
    if response.headers.is_null() {
        return ptr::null_mut();
    }
    let headers = std::slice::from_raw_parts(response.headers, response.header_count);
    for h in headers {
        if CStr::from_ptr(h.name).to_bytes() == name.as_bytes() {
            return CStr::from_ptr(h.value).to_owned().into_raw();
        }
    }
    ptr::null_mut()
}

/// Free a response returned by sfoglia_fetch and everything it owns. No-op if ptr is NULL.
#[no_mangle]
pub unsafe extern "C" fn sfoglia_free_response(ptr: *mut SfogliaResponse) {
    if ptr.is_null() {
        return;
    }
    let response = Box::from_raw(ptr);
    if !response.headers.is_null() {
        let headers: Box<[SfogliaHeader]> = Box::from_raw(ptr::slice_from_raw_parts_mut(
            response.headers,
            response.header_count,
        ));
        for h in headers.iter() {
            if !h.name.is_null() {
                let _ = CString::from_raw(h.name);
            }
            if !h.value.is_null() {
                let _ = CString::from_raw(h.value);
            }
        }
    }
    if !response.body.is_null() {
        let _: Box<[u8]> = Box::from_raw(ptr::slice_from_raw_parts_mut(
            response.body as *mut u8,
            response.body_len + 1,
        ));
    }
}

/// Last error message from a failed call on this thread. Valid until the next FFI call. Do not free.
#[no_mangle]
pub extern "C" fn sfoglia_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// SFOGLIA_ERROR_* kind of the last failed call on this thread, SFOGLIA_OK after a success.
#[no_mangle]
pub extern "C" fn sfoglia_last_error_kind() -> c_int {
    LAST_ERROR_KIND.with(|k| k.get())
}

/// Free a string returned by sfoglia_response_header. No-op if ptr is NULL.
#[no_mangle]
pub unsafe extern "C" fn sfoglia_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}
