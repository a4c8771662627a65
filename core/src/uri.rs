/*
 * uri.rs
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

//! Request URIs: `http(s)://host[:port]/path?query`, resolution of relative paths against a
//! configured base, and percent-encoding of query and form components.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{ApiError, ApiResult};

/// Query/form component safe set: everything but unreserved characters is encoded.
const COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Path safe set: like the component set but keeps `/` and already-encoded `%XX`.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Absolute HTTP(S) URI split into the parts the transport needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    secure: bool,
    host: String,
    port: u16,
    /// Path plus optional `?query`, always starting with `/`.
    path_and_query: String,
}

impl Uri {
    /// Parse an absolute `http://` or `https://` URI. Fragments are dropped.
    pub fn parse(s: &str) -> ApiResult<Self> {
        let s = s.trim();
        let (secure, rest) = if let Some(rest) = strip_prefix_ignore_case(s, "https://") {
            (true, rest)
        } else if let Some(rest) = strip_prefix_ignore_case(s, "http://") {
            (false, rest)
        } else {
            return Err(ApiError::parameter(format!("not an absolute http(s) URI: {}", s)));
        };
        let rest = rest.split('#').next().unwrap_or(rest);
        let split = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(split);
        let authority = authority.rsplit('@').next().unwrap_or(authority);
        if authority.is_empty() {
            return Err(ApiError::parameter(format!("missing host: {}", s)));
        }
        let default_port = if secure { 443 } else { 80 };
        let (host, port) = split_host_port(authority, default_port)
            .ok_or_else(|| ApiError::parameter(format!("invalid authority: {}", authority)))?;
        let path_and_query = if tail.is_empty() {
            "/".to_string()
        } else if tail.starts_with('?') {
            format!("/{}", tail)
        } else {
            tail.to_string()
        };
        Ok(Self {
            secure,
            host,
            port,
            path_and_query: utf8_percent_encode(&path_and_query, PATH).to_string(),
        })
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    pub fn path(&self) -> &str {
        self.path_and_query
            .split('?')
            .next()
            .unwrap_or(&self.path_and_query)
    }

    pub fn query(&self) -> Option<&str> {
        self.path_and_query.split_once('?').map(|(_, q)| q)
    }

    fn is_default_port(&self) -> bool {
        (self.secure && self.port == 443) || (!self.secure && self.port == 80)
    }

    /// `host` or `host:port` as sent in the Host header.
    pub fn authority(&self) -> String {
        if self.is_default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Append `name=value` to the query, percent-encoding both.
    pub fn append_query(&mut self, name: &str, value: &str) {
        let sep = if self.path_and_query.contains('?') { '&' } else { '?' };
        self.path_and_query.push(sep);
        self.path_and_query.push_str(&encode_component(name));
        self.path_and_query.push('=');
        self.path_and_query.push_str(&encode_component(value));
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme(), self.authority(), self.path_and_query)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let matched = s
        .as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()));
    // An ASCII prefix match ends on a char boundary.
    matched.then(|| &s[prefix.len()..])
}

/// Split `host[:port]` or `[v6]:port`.
fn split_host_port(authority: &str, default_port: u16) -> Option<(String, u16)> {
    if let Some(rest) = authority.strip_prefix('[') {
        let close = rest.find(']')?;
        let host = &rest[..close];
        let after = &rest[close + 1..];
        let port = match after.strip_prefix(':') {
            Some(p) => p.parse().ok()?,
            None if after.is_empty() => default_port,
            None => return None,
        };
        return Some((host.to_string(), port));
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Some((host.to_string(), port.parse().ok()?)),
        Some(_) => None,
        None => Some((authority.to_string(), default_port)),
    }
}

/// Maps the path given to `ApiClient::get/post/delete` to an absolute URI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UriResolver {
    /// The path must already be an absolute URI.
    #[default]
    Absolute,
    /// Paths are appended to this base; absolute URIs pass through unchanged.
    Relative(String),
}

impl UriResolver {
    pub fn relative(base: impl Into<String>) -> Self {
        Self::Relative(base.into())
    }

    pub fn resolve(&self, path: &str) -> ApiResult<Uri> {
        match self {
            UriResolver::Absolute => Uri::parse(path),
            UriResolver::Relative(base) => {
                if strip_prefix_ignore_case(path, "http://").is_some()
                    || strip_prefix_ignore_case(path, "https://").is_some()
                {
                    return Uri::parse(path);
                }
                let joined = format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                Uri::parse(&joined)
            }
        }
    }
}

/// Percent-encode a query or form component.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Decode a percent-encoded component.
pub fn decode_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// `application/x-www-form-urlencoded` body from name/value pairs.
pub fn encode_form<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}
