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

//! Sfoglia core: fetch a URL and return its response headers and decoded body text.
//!
//! Supported schemes are `http`, `https` (rustls, system roots with webpki fallback) and `data`.

pub mod config;
pub mod error;
pub mod fetch;
pub mod net;
pub mod protocol;
pub mod uri;

pub use config::{ConfigError, FetchConfig};
pub use error::{ErrorKind, FetchError};
pub use fetch::{fetch, fetch_blocking, Fetcher};
pub use protocol::http::{Decoders, HeaderMap};
pub use uri::{ParsedUrl, Scheme};
