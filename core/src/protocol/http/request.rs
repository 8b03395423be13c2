/*
 * request.rs
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

//! HTTP/1.1 GET request: request line plus a fixed, ordered header set.
//!
//! Headers in wire order: Host, Accept-Encoding, Connection: close, then User-Agent when set.
//! No body is ever sent.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::FetchError;
use crate::protocol::http::Decoders;
use crate::uri::Scheme;

/// Host header value: bare host on the scheme's default port, host:port otherwise.
pub fn host_header(host: &str, port: u16, scheme: Scheme) -> String {
    if scheme.default_port() == Some(port) {
        host.to_string()
    } else {
        format!("{}:{}", host, port)
    }
}

/// A GET request ready to be written to a stream.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub path: String,
    /// Ordered (name, value) pairs.
    pub headers: Vec<(String, String)>,
}

impl RequestBuilder {
    /// GET `path` on `host` (already formatted by [`host_header`]), advertising `decoders`.
    pub fn get(host: &str, path: &str, decoders: &Decoders) -> Self {
        let headers = vec![
            ("Host".to_string(), host.to_string()),
            (
                "Accept-Encoding".to_string(),
                decoders.accept_encoding().to_string(),
            ),
            ("Connection".to_string(), "close".to_string()),
        ];
        Self {
            path: path.to_string(),
            headers,
        }
    }

    /// Append a header after the fixed set.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialized request, CRLF line endings, blank-line terminated.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut req = format!("GET {} HTTP/1.1\r\n", self.path);
        for (k, v) in &self.headers {
            req.push_str(k);
            req.push_str(": ");
            req.push_str(v);
            req.push_str("\r\n");
        }
        req.push_str("\r\n");
        req.into_bytes()
    }

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut W) -> Result<(), FetchError> {
        stream
            .write_all(&self.to_bytes())
            .await
            .map_err(FetchError::Connection)?;
        stream.flush().await.map_err(FetchError::Connection)?;
        Ok(())
    }
}
