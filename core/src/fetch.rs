/*
 * fetch.rs
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

//! fetch(url) -> (headers, body text).
//!
//! data: URLs are answered from the URL itself. http and https go through
//! parse → connect → write request → read response → decode body; the first error from any
//! stage is returned as is. Each request uses its own connection, closed before the call
//! returns. Redirects are followed only when `FetchConfig::max_redirects` allows it.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::protocol::http::{decode_text, host_header, HeaderMap, HttpClient, RequestBuilder, Response};
use crate::uri::{resolve_location, ParsedUrl, Scheme};

/// Fetch `url` with the default configuration.
pub async fn fetch(url: &str) -> Result<(HeaderMap, String), FetchError> {
    Fetcher::default().fetch(url).await
}

/// Blocking variant of [`fetch`] for synchronous callers.
pub fn fetch_blocking(url: &str) -> Result<(HeaderMap, String), FetchError> {
    Fetcher::default().fetch_blocking(url)
}

/// Runs fetches with one configuration. Holds no connection state between calls.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn fetch(&self, url: &str) -> Result<(HeaderMap, String), FetchError> {
        let mut target = ParsedUrl::parse(url)?;
        let mut redirects_left = self.config.max_redirects;
        tracing::info!("fetch {}", url);

        loop {
            let response = match &target {
                ParsedUrl::Data {
                    content_type,
                    payload,
                } => {
                    let mut headers = HeaderMap::new();
                    headers.insert("content-type", content_type);
                    return Ok((headers, payload.clone()));
                }
                ParsedUrl::Network {
                    scheme,
                    host,
                    port,
                    path,
                } => {
                    self.request(*scheme, host, *port, path, redirects_left > 0)
                        .await?
                }
            };

            if let Some(location) = response.redirect_location() {
                tracing::info!("{} redirect to {}", response.code, location);
                target = resolve_location(&target, location)?;
                redirects_left -= 1;
                continue;
            }

            let text = decode_text(response.body, &response.headers, &self.config.decoders)?;
            return Ok((response.headers, text));
        }
    }

    /// Run [`Fetcher::fetch`] on a current-thread runtime, blocking the caller until it completes.
    pub fn fetch_blocking(&self, url: &str) -> Result<(HeaderMap, String), FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Connection)?;
        runtime.block_on(self.fetch(url))
    }

    /// One request on a fresh connection. The connection is consumed by `send` and closed when
    /// it returns, whether or not it succeeded.
    async fn request(
        &self,
        scheme: Scheme,
        host: &str,
        port: u16,
        path: &str,
        accept_redirect: bool,
    ) -> Result<Response, FetchError> {
        let conn = HttpClient::connect(host, port, scheme, &self.config).await?;
        let mut request =
            RequestBuilder::get(&host_header(host, port, scheme), path, &self.config.decoders);
        if let Some(user_agent) = &self.config.user_agent {
            request.header("User-Agent", user_agent.as_str());
        }
        conn.send(&request, accept_redirect).await
    }
}
