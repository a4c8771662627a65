/*
 * request.rs
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

//! HTTP request: method, path, headers, optional body.
//!
//! Built via RequestBuilder; sending is done by the connection (send with handler).

use std::fmt;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable request builder: method, path, headers, body.
///
/// Obtain from `HttpConnection::request(method, path)`.
/// Add headers, optionally set body, then call `send(request, handler)` to execute.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub method: Method,
    pub path: String,
    /// Header order is preserved on the wire.
    pub headers: Vec<(String, String)>,
    /// If set, body will be sent (chunked unless Content-Length is set).
    pub body: Option<Vec<u8>>,
}

impl RequestBuilder {
    pub fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add or replace a header. Comparison is case-insensitive per HTTP.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Set request body. If Content-Length is not set, chunked encoding will be used when sent.
    pub fn body(&mut self, data: Vec<u8>) -> &mut Self {
        self.body = Some(data);
        self
    }
}
