/*
 * transport.rs
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

//! Transport seam: sends an `ApiRequest` and pushes response events to a `ResponseHandler`.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use crate::api::client::ApiRequest;
use crate::protocol::http::client::CONNECT_TIMEOUT;
use crate::protocol::http::{HttpClient, ResponseHandler};

pub type SendFuture<'a> = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>;

/// Sends one request.
///
/// Events go to `handler` in order: `ok`/`error`, headers, body chunks, then `complete`.
/// Returning `Err` means the exchange failed; the caller reports it. Dropping the returned future
/// abandons the exchange.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
        handler: &'a mut (dyn ResponseHandler + Send),
    ) -> SendFuture<'a>;
}

/// HTTP/1.1 over TCP or TLS, one connection per request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    connect_timeout: Duration,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
        handler: &'a mut (dyn ResponseHandler + Send),
    ) -> SendFuture<'a> {
        Box::pin(async move {
            let uri = request.uri();
            let mut connection = HttpClient::connect_with_timeout(
                uri.host(),
                uri.port(),
                uri.is_secure(),
                self.connect_timeout,
            )
            .await?;
            let mut http_request = connection.request(request.method(), uri.path_and_query());
            for (name, value) in request.headers() {
                http_request.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body() {
                http_request.body(body.to_vec());
            }
            connection.send(&http_request, handler).await
        })
    }
}
