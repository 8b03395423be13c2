/*
 * connection.rs
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

//! HTTP connection: one TCP or TLS stream, one request, drives the H1 parser until the response
//! is complete. The stream closes when the connection is dropped.

use bytes::BytesMut;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;

use crate::error::FetchError;
use crate::protocol::http::h1::{Framing, H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::request::RequestBuilder;
use crate::protocol::http::response::{is_redirect_status, Response};
use crate::protocol::http::HeaderMap;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl HttpStream {
    pub fn is_tls(&self) -> bool {
        matches!(self, HttpStream::Tls(_))
    }
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Collects H1 parser callbacks into status, headers and raw body.
#[derive(Default)]
struct ResponseCollector {
    status: Option<(u16, String)>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl H1ResponseHandler for ResponseCollector {
    fn status(&mut self, code: u16, reason: &str) {
        self.status = Some((code, reason.to_string()));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.insert(name, value);
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }
}

/// HTTP connection: holds the stream and drives the read loop. Call send() once.
pub struct HttpConnection {
    stream: HttpStream,
    host: String,
    port: u16,
    read_timeout: Duration,
    read_buf: BytesMut,
    parser: ResponseParser,
}

impl HttpConnection {
    /// Create from an already-connected stream. Used by HttpClient::connect().
    pub fn new(stream: HttpStream, host: String, port: u16, read_timeout: Duration) -> Self {
        Self {
            stream,
            host,
            port,
            read_timeout,
            read_buf: BytesMut::with_capacity(8192),
            parser: ResponseParser::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.stream.is_tls()
    }

    /// Send the request and read the response.
    ///
    /// A 200 response is read to the end of its body. A redirect with a Location header is
    /// returned without its body when `accept_redirect` is set. Any other status fails with
    /// `FetchError::Http` before the body is read.
    pub async fn send(
        mut self,
        request: &RequestBuilder,
        accept_redirect: bool,
    ) -> Result<Response, FetchError> {
        tracing::debug!(
            "GET {} on {}:{}{}",
            request.path,
            self.host(),
            self.port(),
            if self.is_secure() { " (TLS)" } else { "" }
        );
        request.write_to(&mut self.stream).await?;

        let mut collector = ResponseCollector::default();
        loop {
            self.parser.receive(&mut self.read_buf, &mut collector)?;
            if self.parser.state() == ParseState::HeadersComplete {
                break;
            }
            if self.fill_buf().await? == 0 {
                return Err(self.parser.eof().err().unwrap_or_else(|| {
                    FetchError::protocol("connection closed before end of headers")
                }));
            }
        }

        let (code, reason) = collector
            .status
            .take()
            .ok_or_else(|| FetchError::protocol("missing status line"))?;
        tracing::debug!("status {} {}", code, reason);

        if accept_redirect && is_redirect_status(code) && collector.headers.contains("location") {
            return Ok(Response::new(code, reason, collector.headers, Vec::new()));
        }
        if code != 200 {
            return Err(FetchError::Http {
                status: code,
                reason,
            });
        }

        let framing = Framing::from_headers(&collector.headers)?;
        tracing::debug!("body framing {:?}", framing);
        self.parser.set_body_mode(framing);
        while !self.parser.is_done() {
            self.parser.receive(&mut self.read_buf, &mut collector)?;
            if self.parser.is_done() {
                break;
            }
            if self.fill_buf().await? == 0 {
                self.parser.eof()?;
            }
        }

        Ok(Response::new(code, reason, collector.headers, collector.body))
    }

    /// Read once from the stream into read_buf. Returns 0 at end of stream.
    async fn fill_buf(&mut self) -> Result<usize, FetchError> {
        let mut tmp = [0u8; 8192];
        let n = match timeout(self.read_timeout, self.stream.read(&mut tmp)).await {
            Err(_) => return Err(FetchError::timed_out("read")),
            Ok(Ok(n)) => n,
            // Servers commonly close without close_notify; framing still detects truncation.
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof && self.stream.is_tls() => 0,
            Ok(Err(e)) => return Err(FetchError::Connection(e)),
        };
        self.read_buf.extend_from_slice(&tmp[..n]);
        Ok(n)
    }
}
