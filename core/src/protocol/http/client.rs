/*
 * client.rs
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

//! HTTP client: connect to a host, then use the connection to send one request.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::net::{connect_tcp, connect_tls};
use crate::protocol::http::connection::{HttpConnection, HttpStream};
use crate::uri::Scheme;

/// HTTP client. Create a connection with `HttpClient::connect(host, port, scheme, config)`.
pub struct HttpClient;

impl HttpClient {
    /// Connect to the given host and port. For https the TLS handshake (with certificate and
    /// server-name verification) completes before this returns.
    pub async fn connect(
        host: &str,
        port: u16,
        scheme: Scheme,
        config: &FetchConfig,
    ) -> Result<HttpConnection, FetchError> {
        if scheme == Scheme::Data {
            return Err(FetchError::UnsupportedScheme(
                "data URLs have no transport".to_string(),
            ));
        }
        let tcp = connect_tcp(host, port, config.connect_timeout).await?;
        let stream = if scheme.is_secure() {
            let tls = connect_tls(tcp, host, config.connect_timeout).await?;
            HttpStream::Tls(Box::new(tls))
        } else {
            HttpStream::Plain(tcp)
        };
        Ok(HttpConnection::new(
            stream,
            host.to_string(),
            port,
            config.read_timeout,
        ))
    }
}
