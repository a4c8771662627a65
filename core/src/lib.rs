/*
 * lib.rs
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

//! Netapi core: an HTTP API client whose responses are either decoded once (single-shot)
//! or carved incrementally into records (lines, Server-Sent-Events) as the body arrives.
//!
//! Layers, leaves first:
//! - `protocol::http`: push-parsed HTTP/1.1 transport (`ResponseHandler` callbacks).
//! - `api::framer` / `api::event` / `api::decoder`: record boundaries and per-kind decoding.
//! - `api::consumer`: streaming drain loop and single-shot buffering.
//! - `api::pipeline` / `api::future`: transport callbacks to a cancellable `ResponseFuture`.
//! - `api::client`: `ApiClient` with `get`/`post`/`delete` and `execute*`.

pub mod api;
pub mod config;
pub mod error;
pub mod mime;
pub mod net;
pub mod protocol;
pub mod uri;

pub use api::{
    ApiClient, ApiRequest, ApiRequestBuilder, CancelHandle, EventStream, FieldPolicy,
    FutureCallback, HttpTransport, ResponseFuture, StreamCallback, Transport,
};
pub use config::{ClientConfig, ClientConfigBuilder, ContentTypePolicy};
pub use error::{ApiError, ApiResult};
pub use mime::ContentType;
pub use uri::{Uri, UriResolver};
