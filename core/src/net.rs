/*
 * net.rs
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

//! TCP and TLS connection helpers: connect with a timeout, wrap a TcpStream with rustls.
//!
//! Certificates are always verified against the platform trust store (Mozilla roots when the
//! platform store is empty) and the server name is always checked; there is no way to turn
//! verification off.

use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::error::FetchError;

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = root_store.add_parsable_certificates(certs);
            tracing::debug!("loaded {} native root certificates ({} ignored)", added, ignored);
        }
        Err(e) => tracing::warn!("could not load native root certificates: {}", e),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

/// TLS client config for HTTP/1.1 (ALPN http/1.1 only, no client auth).
pub fn http_client_config() -> Arc<ClientConfig> {
    let mut config = ClientConfig::builder()
        .with_root_certificates(build_root_store())
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Arc::new(config)
}

static HTTP_CONNECTOR: OnceLock<TlsConnector> = OnceLock::new();

fn http_connector() -> &'static TlsConnector {
    HTTP_CONNECTOR.get_or_init(|| TlsConnector::from(http_client_config()))
}

/// Resolve and connect to host:port, giving up after `connect_timeout`.
pub async fn connect_tcp(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<TcpStream, FetchError> {
    let addr = format!("{}:{}", host, port);
    let tcp = timeout(connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| FetchError::timed_out("TCP connect"))?
        .map_err(FetchError::Connection)?;
    tracing::debug!("connected to {}", addr);
    Ok(tcp)
}

/// TLS handshake over an established TCP stream, verifying `host` against the peer certificate.
pub async fn connect_tls(
    tcp: TcpStream,
    host: &str,
    handshake_timeout: Duration,
) -> Result<TlsStream<TcpStream>, FetchError> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| FetchError::TlsHandshake(format!("invalid server name {:?}", host)))?;
    let tls = timeout(handshake_timeout, http_connector().connect(server_name, tcp))
        .await
        .map_err(|_| FetchError::timed_out("TLS handshake"))?
        .map_err(|e| FetchError::TlsHandshake(describe_handshake_error(&e)))?;
    tracing::debug!("TLS established with {}", host);
    Ok(tls)
}

/// rustls reports handshake failures as io::Error wrapping rustls::Error.
fn describe_handshake_error(e: &io::Error) -> String {
    match e.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()) {
        Some(rustls::Error::InvalidCertificate(cert_err)) => {
            format!("certificate rejected: {:?}", cert_err)
        }
        Some(tls_err) => tls_err.to_string(),
        None => e.to_string(),
    }
}
