/*
 * client.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Netapi, an HTTP API client library.
 *
 * Netapi is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Netapi is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Netapi.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP client: connect to a host, then use the connection to send requests with a callback handler.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use crate::net::http_client_config;
use crate::protocol::http::connection::{HttpConnection, HttpStream};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client. Create with `HttpClient::connect(host, port, use_tls)` then use the returned connection to build requests and send with a handler.
pub struct HttpClient;

impl HttpClient {
    /// Connect to the given host and port with the default connect timeout.
    pub async fn connect(host: &str, port: u16, use_tls: bool) -> io::Result<HttpConnection> {
        Self::connect_with_timeout(host, port, use_tls, CONNECT_TIMEOUT).await
    }

    /// Connect to the given host and port. If `use_tls` is true, performs a TLS handshake with ALPN `http/1.1`.
    /// The timeout covers TCP connect and the TLS handshake.
    pub async fn connect_with_timeout(
        host: &str,
        port: u16,
        use_tls: bool,
        connect_timeout: Duration,
    ) -> io::Result<HttpConnection> {
        timeout(connect_timeout, Self::open(host, port, use_tls))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {}:{} timed out", host, port),
                )
            })?
    }

    async fn open(host: &str, port: u16, use_tls: bool) -> io::Result<HttpConnection> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;
        log::debug!("connected to {}:{} (tls={})", host, port, use_tls);

        if use_tls {
            let server_name = ServerName::try_from(host.to_string())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?;
            let connector = TlsConnector::from(http_client_config());
            let tls = connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
            Ok(HttpConnection::new(
                HttpStream::Tls(Box::new(tls)),
                host.to_string(),
                port,
                true,
            ))
        } else {
            Ok(HttpConnection::new(
                HttpStream::Plain(tcp),
                host.to_string(),
                port,
                false,
            ))
        }
    }
}
