/*
 * parser.rs
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

//! HTTP/1.x response push parser: status line, headers, body (Content-Length, chunked or
//! read-until-close).

use bytes::Buf;
use bytes::BytesMut;

use crate::error::FetchError;
use crate::protocol::http::HeaderMap;

/// Callback for HTTP/1.x response events. The connection implements this to collect the response.
pub trait H1ResponseHandler {
    fn status(&mut self, code: u16, reason: &str);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    StatusLine,
    Headers,
    /// Headers done; connection must call set_body_mode() before feeding more data.
    HeadersComplete,
    Body,
    ChunkSize,
    ChunkData,
    /// Response complete. Bytes left in the buffer are not part of it.
    Done,
}

/// How the message body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Chunked,
    Length(u64),
    UntilClose,
}

impl Framing {
    /// Transfer-Encoding wins over Content-Length; neither means the body runs to EOF.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, FetchError> {
        if let Some(te) = headers.get("transfer-encoding") {
            return if te.eq_ignore_ascii_case("chunked") {
                Ok(Framing::Chunked)
            } else {
                Err(FetchError::UnsupportedFraming(te.to_string()))
            };
        }
        match headers.get("content-length") {
            Some(cl) => cl
                .parse::<u64>()
                .map(Framing::Length)
                .map_err(|_| FetchError::protocol(format!("invalid content-length {:?}", cl))),
            None => Ok(Framing::UntilClose),
        }
    }
}

/// Push parser for an HTTP/1.x response. Feed bytes via `receive`; handler is invoked as complete tokens are parsed.
pub struct ResponseParser {
    state: ParseState,
    /// Content-Length when known; None for chunked or read-until-close.
    content_length: Option<u64>,
    bytes_received: u64,
    /// Bytes left in the current chunk.
    chunk_remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            content_length: None,
            bytes_received: 0,
            chunk_remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    /// Length of the line at the start of buf (excluding CRLF), or None if no CRLF yet.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Take one CRLF-terminated line off the front of buf, as UTF-8 without the CRLF.
    fn take_line(buf: &mut BytesMut, what: &str) -> Result<Option<String>, FetchError> {
        let line_end = match Self::find_crlf(buf) {
            Some(n) => n,
            None => return Ok(None),
        };
        let line = buf.split_to(line_end + 2);
        let line = std::str::from_utf8(&line[..line_end])
            .map_err(|_| FetchError::protocol(format!("{} is not valid UTF-8", what)))?;
        Ok(Some(line.to_string()))
    }

    /// Consume and parse as much as possible from buf. Partial lines stay in buf for the next call.
    pub fn receive<H: H1ResponseHandler>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), FetchError> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line = match Self::take_line(buf, "status line")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    let (code, reason) = parse_status_line(&line)?;
                    handler.status(code, reason);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line = match Self::take_line(buf, "header line")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    let (name, value) = line
                        .split_once(':')
                        .ok_or_else(|| FetchError::protocol(format!("malformed header line {:?}", line)))?;
                    handler.header(&name.trim().to_ascii_lowercase(), value.trim());
                }
                ParseState::HeadersComplete | ParseState::Done => return Ok(()),
                ParseState::Body => {
                    match self.content_length {
                        Some(content_length) => {
                            let remaining = content_length - self.bytes_received;
                            let to_read = remaining.min(buf.len() as u64) as usize;
                            if to_read > 0 {
                                let chunk = buf.split_to(to_read);
                                handler.body_chunk(&chunk);
                                self.bytes_received += to_read as u64;
                            }
                            if self.bytes_received >= content_length {
                                self.state = ParseState::Done;
                            }
                        }
                        None => {
                            let chunk = buf.split_to(buf.len());
                            handler.body_chunk(&chunk);
                        }
                    }
                }
                ParseState::ChunkSize => {
                    let line = match Self::take_line(buf, "chunk size")? {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    let hex_part = line.split(';').next().unwrap_or(&line).trim();
                    self.chunk_remaining = u64::from_str_radix(hex_part, 16)
                        .map_err(|_| FetchError::protocol(format!("invalid chunk size {:?}", line)))?;
                    if self.chunk_remaining == 0 {
                        // Last chunk: trailers and anything after are not read.
                        self.state = ParseState::Done;
                        return Ok(());
                    }
                    self.state = ParseState::ChunkData;
                }
                ParseState::ChunkData => {
                    if self.chunk_remaining > 0 {
                        let to_read = self.chunk_remaining.min(buf.len() as u64) as usize;
                        let chunk = buf.split_to(to_read);
                        handler.body_chunk(&chunk);
                        self.chunk_remaining -= to_read as u64;
                    }
                    if self.chunk_remaining > 0 {
                        return Ok(());
                    }
                    // Chunk delimiter (CRLF) is discarded unseen.
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
            }
        }
        Ok(())
    }

    /// Called by the connection once headers are in (state HeadersComplete).
    pub fn set_body_mode(&mut self, framing: Framing) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        self.bytes_received = 0;
        match framing {
            Framing::Chunked => {
                self.content_length = None;
                self.state = ParseState::ChunkSize;
            }
            Framing::Length(0) => {
                self.content_length = Some(0);
                self.state = ParseState::Done;
            }
            Framing::Length(cl) => {
                self.content_length = Some(cl);
                self.state = ParseState::Body;
            }
            Framing::UntilClose => {
                self.content_length = None;
                self.state = ParseState::Body;
            }
        }
    }

    /// The peer closed the connection. Completes a read-until-close body; anything else is truncated.
    pub fn eof(&mut self) -> Result<(), FetchError> {
        match self.state {
            ParseState::Done => Ok(()),
            ParseState::Body if self.content_length.is_none() => {
                self.state = ParseState::Done;
                Ok(())
            }
            ParseState::StatusLine | ParseState::Headers | ParseState::HeadersComplete => Err(
                FetchError::protocol("connection closed before end of headers"),
            ),
            _ => Err(FetchError::protocol("connection closed before end of body")),
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `HTTP/1.1 200 OK` → (200, "OK"). Three space-separated tokens are required; the reason may be empty.
fn parse_status_line(line: &str) -> Result<(u16, &str), FetchError> {
    let mut parts = line.splitn(3, ' ');
    let (version, code, reason) = match (parts.next(), parts.next(), parts.next()) {
        (Some(version), Some(code), Some(reason)) => (version, code, reason),
        _ => return Err(FetchError::protocol(format!("malformed status line {:?}", line))),
    };
    if !version.starts_with("HTTP/") {
        return Err(FetchError::protocol(format!("not an HTTP response: {:?}", line)));
    }
    let code = code
        .parse::<u16>()
        .map_err(|_| FetchError::protocol(format!("invalid status code {:?}", code)))?;
    Ok((code, reason.trim()))
}
