/*
 * mod.rs
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

//! HTTP client transport: HTTP/1.1 client with push-parsed responses.
//!
//! - Callback-based response API: `ResponseHandler` with `ok`/`error`, `header`, `start_body`, `body_chunk`, `end_body`, `complete`, `failed`, `cancelled`.
//! - Buffers: `bytes` crate (BytesMut for the parse buffer).
//! - HTTP/1.1: state-machine response parser (Content-Length, chunked, read-until-close).
//! - TLS via tokio-rustls with ALPN `http/1.1`.

mod handler;
mod request;
mod response;

pub mod h1;

pub use handler::ResponseHandler;
pub use h1::H1ResponseHandler;
pub use request::{Method, RequestBuilder};
pub use response::Response;

pub mod client;
pub mod connection;

pub use client::HttpClient;
pub use connection::{HttpConnection, HttpStream};
