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

//! API client: request building and `execute*`.
//!
//! The requested element type picks the decoder from the configured registry. Each request runs
//! as a task on the tokio runtime captured when the client was built and resolves a
//! `ResponseFuture`.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tokio::runtime::Handle;

use crate::api::callback::{FutureCallback, StreamCallback};
use crate::api::consumer::{ResponseConsumer, SingleShotConsumer, StreamingConsumer};
use crate::api::decoder::StreamKind;
use crate::api::future::{ResponseFuture, Shared};
use crate::api::pipeline::ResponseAssembler;
use crate::api::transport::{HttpTransport, Transport};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::mime::{APPLICATION_FORM_URLENCODED, APPLICATION_JSON};
use crate::protocol::http::{Method, ResponseHandler};
use crate::uri::{encode_form, Uri};

/// A fully built request. The body, if any, is materialized so it can be sent with a Content-Length.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)?;
        if let Some(body) = &self.body {
            write!(
                f,
                " [Length: {}, Type: {}]",
                body.len(),
                self.header("Content-Type").unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

/// Builder from `ApiClient::get/post/delete`. Errors are held until `build()`.
#[derive(Debug)]
pub struct ApiRequestBuilder {
    method: Method,
    uri: Uri,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    charset: &'static encoding_rs::Encoding,
    error: Option<ApiError>,
}

impl ApiRequestBuilder {
    fn new(method: Method, uri: Uri, config: &ClientConfig) -> Self {
        Self {
            method,
            uri,
            headers: config.default_headers().to_vec(),
            body: None,
            charset: config.charset(),
            error: None,
        }
    }

    /// Add or replace a header (case-insensitive name).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || name.contains([':', '\r', '\n']) || value.contains(['\r', '\n']) {
            self.error
                .get_or_insert_with(|| ApiError::parameter(format!("invalid header: {:?}", name)));
            return self;
        }
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

    /// Append a percent-encoded query parameter.
    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.uri.append_query(name, &value.to_string());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.header("Content-Type", content_type)
    }

    /// Text body encoded in the configured charset.
    pub fn text(self, text: &str) -> Self {
        let charset = self.charset;
        let (bytes, _, _) = charset.encode(text);
        let content_type = format!("text/plain; charset={}", charset.name());
        self.body(bytes.into_owned(), content_type)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body(
                bytes,
                format!("{}/{}", APPLICATION_JSON.0, APPLICATION_JSON.1),
            ),
            Err(e) => {
                self.error.get_or_insert(ApiError::from(e));
                self
            }
        }
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn form<'a, I>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let body = encode_form(pairs);
        self.body(
            body.into_bytes(),
            format!(
                "{}/{}",
                APPLICATION_FORM_URLENCODED.0, APPLICATION_FORM_URLENCODED.1
            ),
        )
    }

    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{}:{}", username, password));
        self.header("Authorization", format!("Basic {}", token))
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn build(self) -> ApiResult<ApiRequest> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(ApiRequest {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// Entry point: builds requests and executes them with decoders from the registry.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    runtime: Handle,
}

impl ApiClient {
    /// Client over `HttpTransport`, running requests on the current tokio runtime.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::with_transport(config, HttpTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> ApiResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ApiError::parameter(format!("no tokio runtime: {}", e)))?;
        Ok(Self::with_runtime(config, transport, runtime))
    }

    pub fn with_runtime(
        config: ClientConfig,
        transport: impl Transport + 'static,
        runtime: Handle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            runtime,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builder for `method` on `path`, resolved with the configured `UriResolver`.
    pub fn request(&self, method: Method, path: &str) -> ApiResult<ApiRequestBuilder> {
        let uri = self.config.uri_resolver().resolve(path)?;
        Ok(self.request_uri(method, uri))
    }

    /// Builder for an already resolved URI.
    pub fn request_uri(&self, method: Method, uri: Uri) -> ApiRequestBuilder {
        ApiRequestBuilder::new(method, uri, &self.config)
    }

    pub fn get(&self, path: &str) -> ApiResult<ApiRequestBuilder> {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> ApiResult<ApiRequestBuilder> {
        self.request(Method::Post, path)
    }

    pub fn delete(&self, path: &str) -> ApiResult<ApiRequestBuilder> {
        self.request(Method::Delete, path)
    }

    /// Single-shot request: the whole body decoded as `T`.
    pub fn execute<T: Send + 'static>(&self, request: ApiRequest) -> ApiResult<ResponseFuture<T>> {
        self.execute_with_callback(request, ())
    }

    /// Single-shot request with terminal hooks run before the future resolves.
    pub fn execute_with_callback<T, C>(&self, request: ApiRequest, callback: C) -> ApiResult<ResponseFuture<T>>
    where
        T: Send + 'static,
        C: FutureCallback<T> + 'static,
    {
        let decoder = self.config.registry().body_decoder::<T>().ok_or_else(|| {
            ApiError::parameter(format!("no response decoder for {}", type_name::<T>()))
        })?;
        let shared = Shared::<T>::new();
        Ok(self.spawn(request, SingleShotConsumer::new(decoder, callback), shared))
    }

    /// Streaming request: each record goes to `callback` as soon as it is decoded. The future
    /// resolves with `()` at the end of the response.
    pub fn execute_stream<T, C>(&self, request: ApiRequest, callback: C) -> ApiResult<ResponseFuture<()>>
    where
        T: Send + 'static,
        C: StreamCallback<T> + 'static,
    {
        let kind = self.stream_kind::<T>()?;
        let shared = Shared::<()>::new();
        let consumer: StreamingConsumer<T, C, ()> =
            StreamingConsumer::new(kind, callback, shared.terminal_flag());
        Ok(self.spawn(request, consumer, shared))
    }

    /// Streaming request that also collects every record, in order, into the future's result.
    pub fn execute_stream_collect<T, C>(
        &self,
        request: ApiRequest,
        callback: C,
    ) -> ApiResult<ResponseFuture<Vec<T>>>
    where
        T: Send + 'static,
        C: StreamCallback<T> + 'static,
    {
        let kind = self.stream_kind::<T>()?;
        let shared = Shared::<Vec<T>>::new();
        let consumer: StreamingConsumer<T, C, Vec<T>> =
            StreamingConsumer::new(kind, callback, shared.terminal_flag());
        Ok(self.spawn(request, consumer, shared))
    }

    fn stream_kind<T: 'static>(&self) -> ApiResult<StreamKind<T>> {
        self.config.registry().stream_kind::<T>().ok_or_else(|| {
            ApiError::parameter(format!("no stream kind for {}", type_name::<T>()))
        })
    }

    fn spawn<C>(&self, request: ApiRequest, consumer: C, shared: Arc<Shared<C::Output>>) -> ResponseFuture<C::Output>
    where
        C: ResponseConsumer + 'static,
    {
        log::trace!("request: {}", request);
        let assembler = ResponseAssembler::new(consumer, Arc::clone(&shared), Arc::clone(&self.config));
        self.runtime
            .spawn(drive(Arc::clone(&self.transport), request, assembler));
        ResponseFuture::new(shared)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Request task: races the transport against cancellation.
async fn drive<C>(transport: Arc<dyn Transport>, request: ApiRequest, mut assembler: ResponseAssembler<C>)
where
    C: ResponseConsumer + 'static,
{
    let shared = assembler.shared();
    if shared.is_terminal() {
        assembler.cancelled();
        return;
    }
    let outcome = tokio::select! {
        result = transport.send(request, &mut assembler) => Some(result),
        _ = shared.cancel_requested() => None,
    };
    match outcome {
        Some(Ok(())) => assembler.finish_unterminated(),
        Some(Err(e)) => assembler.failed(e),
        None => assembler.cancelled(),
    }
}
