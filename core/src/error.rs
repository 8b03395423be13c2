/*
 * error.rs
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

//! Fetch errors. Every stage of the pipeline fails with one of these kinds and the
//! first failure reaches the caller unchanged.

use std::fmt;
use std::io;

/// Errors from URL parsing, transport, HTTP parsing or body decoding.
#[derive(Debug)]
pub enum FetchError {
    /// Scheme is not http, https or data.
    UnsupportedScheme(String),
    /// No scheme separator, missing authority, bad port, empty host, data URL without a comma.
    MalformedUrl(String),
    /// DNS lookup, connect, read or write failed (timeouts included).
    Connection(io::Error),
    /// Invalid server name, certificate rejected or handshake failed.
    TlsHandshake(String),
    /// Status line, header line or body framing did not follow HTTP/1.x.
    Protocol(String),
    /// Final status was not 200.
    Http { status: u16, reason: String },
    /// Transfer-Encoding other than chunked.
    UnsupportedFraming(String),
    /// Unknown content-encoding, corrupt compressed data or body not valid UTF-8.
    Decoding(String),
    /// Content-encoding received for which no decoder is available.
    MissingDecoder(String),
}

/// Payload-free discriminant of [`FetchError`], for matching and for the C FFI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedScheme,
    MalformedUrl,
    Connection,
    TlsHandshake,
    Protocol,
    Http,
    UnsupportedFraming,
    Decoding,
    MissingDecoder,
}

impl ErrorKind {
    /// Stable numeric code (0 is reserved for "no error").
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::UnsupportedScheme => 1,
            ErrorKind::MalformedUrl => 2,
            ErrorKind::Connection => 3,
            ErrorKind::TlsHandshake => 4,
            ErrorKind::Protocol => 5,
            ErrorKind::Http => 6,
            ErrorKind::UnsupportedFraming => 7,
            ErrorKind::Decoding => 8,
            ErrorKind::MissingDecoder => 9,
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::UnsupportedScheme(_) => ErrorKind::UnsupportedScheme,
            FetchError::MalformedUrl(_) => ErrorKind::MalformedUrl,
            FetchError::Connection(_) => ErrorKind::Connection,
            FetchError::TlsHandshake(_) => ErrorKind::TlsHandshake,
            FetchError::Protocol(_) => ErrorKind::Protocol,
            FetchError::Http { .. } => ErrorKind::Http,
            FetchError::UnsupportedFraming(_) => ErrorKind::UnsupportedFraming,
            FetchError::Decoding(_) => ErrorKind::Decoding,
            FetchError::MissingDecoder(_) => ErrorKind::MissingDecoder,
        }
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        FetchError::Protocol(msg.into())
    }

    pub(crate) fn timed_out(what: &str) -> Self {
        FetchError::Connection(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{} timed out", what),
        ))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::UnsupportedScheme(s) => write!(f, "unsupported scheme: {}", s),
            FetchError::MalformedUrl(m) => write!(f, "malformed URL: {}", m),
            FetchError::Connection(e) => write!(f, "connection error: {}", e),
            FetchError::TlsHandshake(m) => write!(f, "TLS handshake failed: {}", m),
            FetchError::Protocol(m) => write!(f, "protocol error: {}", m),
            FetchError::Http { status, reason } => write!(f, "{}: {}", status, reason),
            FetchError::UnsupportedFraming(te) => {
                write!(f, "unsupported transfer-encoding: {}", te)
            }
            FetchError::Decoding(m) => write!(f, "decoding error: {}", m),
            FetchError::MissingDecoder(enc) => {
                write!(f, "no decoder available for content-encoding {}", enc)
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Connection(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_matches_status_line() {
        let e = FetchError::Http {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert_eq!(e.to_string(), "404: Not Found");
        assert_eq!(e.kind(), ErrorKind::Http);
    }

    #[test]
    fn connection_error_keeps_source() {
        use std::error::Error;
        let e = FetchError::timed_out("read");
        assert_eq!(e.kind().code(), 3);
        let source = e.source().and_then(|s| s.downcast_ref::<io::Error>());
        assert_eq!(source.map(|s| s.kind()), Some(io::ErrorKind::TimedOut));
    }
}
