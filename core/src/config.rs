/*
 * config.rs
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

//! Client configuration: URI resolution, charset, default headers, content-type policy and the
//! decoder registry. Built once with `ClientConfig::builder()`, then shared read-only.

use encoding_rs::{Encoding, UTF_8};
use serde::de::DeserializeOwned;

use crate::api::decoder::{BodyDecoder, StreamKind};
use crate::api::event::FieldPolicy;
use crate::api::registry::Registry;
use crate::error::{ApiError, ApiResult};
use crate::uri::UriResolver;

/// What to do when the response content type is not one the selected decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTypePolicy {
    /// Fail with `ApiError::UnsupportedContentType`.
    #[default]
    Reject,
    /// Log a warning and decode anyway.
    Coerce,
}

#[derive(Debug)]
pub struct ClientConfig {
    uri_resolver: UriResolver,
    charset: &'static Encoding,
    default_headers: Vec<(String, String)>,
    content_type_policy: ContentTypePolicy,
    field_policy: FieldPolicy,
    registry: Registry,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    pub fn uri_resolver(&self) -> &UriResolver {
        &self.uri_resolver
    }

    /// Charset for request text and for responses that do not declare a usable one.
    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn content_type_policy(&self) -> ContentTypePolicy {
        self.content_type_policy
    }

    pub fn field_policy(&self) -> FieldPolicy {
        self.field_policy
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfigBuilder::new().assemble(UTF_8)
    }
}

pub struct ClientConfigBuilder {
    uri_resolver: UriResolver,
    charset: Option<String>,
    default_headers: Vec<(String, String)>,
    content_type_policy: ContentTypePolicy,
    field_policy: FieldPolicy,
    registry: Registry,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            uri_resolver: UriResolver::Absolute,
            charset: None,
            default_headers: vec![("Connection".to_string(), "close".to_string())],
            content_type_policy: ContentTypePolicy::default(),
            field_policy: FieldPolicy::default(),
            registry: Registry::new(),
        }
    }

    pub fn uri_resolver(mut self, resolver: UriResolver) -> Self {
        self.uri_resolver = resolver;
        self
    }

    /// Resolve request paths against `base`.
    pub fn base_uri(self, base: impl Into<String>) -> Self {
        self.uri_resolver(UriResolver::relative(base))
    }

    /// Charset by WHATWG label (`utf-8`, `gbk`, `iso-8859-1`, ...). Checked by `build()`.
    pub fn charset(mut self, label: impl Into<String>) -> Self {
        self.charset = Some(label.into());
        self
    }

    /// Add or replace a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .default_headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.default_headers.push((name, value)),
        }
        self
    }

    pub fn remove_default_header(mut self, name: &str) -> Self {
        self.default_headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    pub fn content_type_policy(mut self, policy: ContentTypePolicy) -> Self {
        self.content_type_policy = policy;
        self
    }

    /// Unknown-field policy of the built-in `EventStream` kind.
    pub fn field_policy(mut self, policy: FieldPolicy) -> Self {
        self.field_policy = policy;
        self
    }

    pub fn register_body<T: 'static>(mut self, decoder: impl BodyDecoder<T> + 'static) -> Self {
        self.registry.register_body(decoder);
        self
    }

    pub fn register_stream<T: 'static>(mut self, kind: StreamKind<T>) -> Self {
        self.registry.register_stream(kind);
        self
    }

    pub fn register_json<T: DeserializeOwned + 'static>(mut self) -> Self {
        self.registry.register_json::<T>();
        self
    }

    pub fn register_json_lines<T: DeserializeOwned + 'static>(mut self) -> Self {
        self.registry.register_json_lines::<T>();
        self
    }

    pub fn build(self) -> ApiResult<ClientConfig> {
        let charset = match &self.charset {
            Some(label) => Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| ApiError::parameter(format!("unknown charset: {}", label)))?,
            None => UTF_8,
        };
        Ok(self.assemble(charset))
    }

    fn assemble(self, charset: &'static Encoding) -> ClientConfig {
        let mut registry = Registry::with_builtins(self.field_policy);
        registry.extend(self.registry);
        ClientConfig {
            uri_resolver: self.uri_resolver,
            charset,
            default_headers: self.default_headers,
            content_type_policy: self.content_type_policy,
            field_policy: self.field_policy,
            registry,
        }
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
