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

//! Streaming API client.
//!
//! - `framer` / `event` / `decoder`: carve records out of accumulated text and decode them.
//! - `registry`: requested element type to decoder.
//! - `consumer`: the drain loop (streaming) and whole-body decoding (single-shot).
//! - `pipeline`: transport callbacks to consumer calls, status and content-type checks.
//! - `future` / `callback`: completion, cancellation and caller hooks.
//! - `transport` / `client`: the `Transport` seam and `ApiClient`.

pub mod callback;
pub mod client;
pub mod consumer;
pub mod decoder;
pub mod event;
pub mod framer;
pub mod future;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod transport;

pub use callback::{FutureCallback, StreamCallback};
pub use client::{ApiClient, ApiRequest, ApiRequestBuilder};
pub use consumer::{ResponseConsumer, SingleShotConsumer, StreamResult, StreamingConsumer};
pub use decoder::{BodyDecoder, RecordDecoder, StreamKind};
pub use event::{EventStream, EventStreamParser, FieldPolicy};
pub use framer::{EventStreamFramer, Framer, LineFramer};
pub use future::{CancelHandle, Outcome, ResponseFuture, TerminalFlag};
pub use pipeline::{ResponseAssembler, ResponseHead};
pub use record::{Consumed, ResponseRecord};
pub use registry::Registry;
pub use transport::{HttpTransport, SendFuture, Transport};
