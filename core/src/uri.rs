/*
 * uri.rs
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

//! URL schemes understood by the fetcher: http://host[:port][/path], https://... (authority + path)
//! and data:<content-type>,<payload> (inline, no authority). Nothing is percent-decoded; the path and
//! the data payload are kept exactly as written.

use std::fmt;
use std::str::FromStr;

use crate::error::FetchError;

/// URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Data,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Data => "data",
        }
    }

    /// Default TCP port; data has none.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Scheme::Http => Some(80),
            Scheme::Https => Some(443),
            Scheme::Data => None,
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }
}

impl FromStr for Scheme {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "data" => Ok(Scheme::Data),
            _ => Err(FetchError::UnsupportedScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed URL: either a network location or an inline data payload, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUrl {
    Network {
        scheme: Scheme,
        host: String,
        port: u16,
        /// Always starts with `/`.
        path: String,
    },
    Data {
        content_type: String,
        payload: String,
    },
}

impl ParsedUrl {
    /// Parse `scheme:rest`. Network schemes take `[//]host[:port][/path]`; data needs `type,payload`.
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let (scheme, rest) = url
            .split_once(':')
            .ok_or_else(|| FetchError::MalformedUrl(format!("no scheme in {:?}", url)))?;
        let scheme: Scheme = scheme.parse()?;

        if scheme == Scheme::Data {
            let (content_type, payload) = rest.split_once(',').ok_or_else(|| {
                FetchError::MalformedUrl(format!("data URL without ',': {:?}", url))
            })?;
            return Ok(ParsedUrl::Data {
                content_type: content_type.to_string(),
                payload: payload.to_string(),
            });
        }

        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, format!("/{}", path)),
            None => (rest, "/".to_string()),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| FetchError::MalformedUrl(format!("invalid port {:?}", port)))?;
                (host, port)
            }
            None => (authority, scheme.default_port().unwrap_or(80)),
        };
        if host.is_empty() {
            return Err(FetchError::MalformedUrl(format!("empty host in {:?}", url)));
        }

        Ok(ParsedUrl::Network {
            scheme,
            host: host.to_string(),
            port,
            path,
        })
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            ParsedUrl::Network { scheme, .. } => *scheme,
            ParsedUrl::Data { .. } => Scheme::Data,
        }
    }

    /// scheme://host[:port] with the port omitted when it is the scheme default. None for data URLs.
    pub fn origin(&self) -> Option<String> {
        match self {
            ParsedUrl::Network {
                scheme, host, port, ..
            } => {
                if scheme.default_port() == Some(*port) {
                    Some(format!("{}://{}", scheme, host))
                } else {
                    Some(format!("{}://{}:{}", scheme, host, port))
                }
            }
            ParsedUrl::Data { .. } => None,
        }
    }
}

/// Resolve a Location header value against the URL the response came from.
///
/// A location with its own scheme is parsed as a URL in its own right; redirects to data: URLs
/// are refused.
pub fn resolve_location(base: &ParsedUrl, location: &str) -> Result<ParsedUrl, FetchError> {
    let location = location.trim();
    let resolved = if has_scheme(location) {
        ParsedUrl::parse(location)?
    } else {
        let (origin, path) = match (base.origin(), base) {
            (Some(origin), ParsedUrl::Network { path, .. }) => (origin, path.as_str()),
            _ => {
                return Err(FetchError::protocol(format!(
                    "cannot resolve {:?} without a network base URL",
                    location
                )))
            }
        };
        let url = if let Some(authority) = location.strip_prefix("//") {
            format!("{}://{}", base.scheme(), authority)
        } else if location.starts_with('/') {
            format!("{}{}", origin, location)
        } else {
            let dir = match path.rfind('/') {
                Some(i) => &path[..=i],
                None => "/",
            };
            format!("{}{}{}", origin, dir, location)
        };
        ParsedUrl::parse(&url)?
    };
    if let ParsedUrl::Data { .. } = resolved {
        return Err(FetchError::protocol(format!(
            "refusing redirect to {:?}",
            location
        )));
    }
    Ok(resolved)
}

/// True when `s` starts with `scheme:` (ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )).
fn has_scheme(s: &str) -> bool {
    let token = match s.split_once(':') {
        Some((token, _)) => token,
        None => return false,
    };
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
