/*
 * response.rs
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

//! HTTP response as read off the wire: status, headers, body with transfer framing removed.

use crate::protocol::http::HeaderMap;

/// Status codes that carry a Location to follow.
pub fn is_redirect_status(code: u16) -> bool {
    matches!(code, 301 | 302 | 303 | 307 | 308)
}

#[derive(Debug, Clone)]
pub struct Response {
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    /// Still content-encoded.
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(code: u16, reason: impl Into<String>, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            code,
            reason: reason.into(),
            headers,
            body,
        }
    }

    /// Location target of a redirect response, None for anything else.
    pub fn redirect_location(&self) -> Option<&str> {
        if is_redirect_status(self.code) {
            self.headers.get("location")
        } else {
            None
        }
    }
}
