/*
 * mod.rs
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

//! HTTP/1.1 client for a single GET per connection.
//!
//! Layers, in the order a response passes through them:
//! - `connection`: reads the socket into a `BytesMut` and drives the push parser.
//! - `h1`: status line, headers, transfer framing (chunked / Content-Length / until close).
//! - `encoding`: content-encoding (gzip, deflate, br, identity) and UTF-8.
//!
//! `Connection: close` is always sent; connections are never reused.

mod encoding;
mod headers;
mod request;
mod response;

pub mod h1;

pub use encoding::{decode_content, decode_text, ContentEncoding, Decoders};
pub use headers::HeaderMap;
pub use request::{host_header, RequestBuilder};
pub use response::{is_redirect_status, Response};

pub mod client;
pub mod connection;

pub use client::HttpClient;
pub use connection::{HttpConnection, HttpStream};
