/*
 * decoder.rs
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

//! Decoders turn response text into typed values.
//!
//! - `BodyDecoder<T>`: the whole body at once (single-shot responses).
//! - `RecordDecoder<T>`: one framed record at a time (streaming responses).
//! - `StreamKind<T>`: a `Framer` paired with a `RecordDecoder`.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::api::event::{EventStream, EventStreamParser, FieldPolicy};
use crate::api::framer::{EventStreamFramer, Framer, LineFramer};
use crate::api::record::ResponseRecord;
use crate::error::ApiResult;
use crate::mime::{ContentType, TEXT_EVENT_STREAM};

/// Decodes a complete response body.
pub trait BodyDecoder<T>: Send + Sync {
    /// Name reported in unsupported content type errors.
    fn name(&self) -> &'static str;

    fn accepts(&self, _content_type: &ContentType) -> bool {
        true
    }

    fn decode(&self, body: String, content_type: &ContentType) -> ApiResult<T>;
}

/// Decodes one record. `Ok(None)` drops the record without failing the response.
pub trait RecordDecoder<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, _content_type: &ContentType) -> bool {
        true
    }

    fn decode(&self, record: &str) -> ApiResult<Option<T>>;
}

/// Framing plus decoding for one streamed element type.
pub struct StreamKind<T> {
    framer: Arc<dyn Framer>,
    decoder: Arc<dyn RecordDecoder<T>>,
}

impl<T> Clone for StreamKind<T> {
    fn clone(&self) -> Self {
        Self {
            framer: Arc::clone(&self.framer),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T> StreamKind<T> {
    pub fn new(framer: impl Framer + 'static, decoder: impl RecordDecoder<T> + 'static) -> Self {
        Self {
            framer: Arc::new(framer),
            decoder: Arc::new(decoder),
        }
    }

    pub fn name(&self) -> &'static str {
        self.decoder.name()
    }

    pub fn accepts(&self, content_type: &ContentType) -> bool {
        self.decoder.accepts(content_type)
    }

    /// Frame the next record and decode it. Blank or dropped records come back with no data.
    pub fn extract(&self, buffer: &str, end_of_stream: bool) -> ApiResult<Option<ResponseRecord<T>>> {
        let record = match self.framer.extract(buffer, end_of_stream)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let consumed = record.consumed();
        let data = match record.into_data() {
            Some(text) => self.decoder.decode(&text)?,
            None => None,
        };
        Ok(Some(ResponseRecord::new(data, consumed)))
    }
}

impl StreamKind<String> {
    /// Newline-delimited text records.
    pub fn lines() -> Self {
        Self::new(LineFramer, TextDecoder)
    }
}

impl StreamKind<EventStream> {
    /// `text/event-stream` events.
    pub fn event_stream(policy: FieldPolicy) -> Self {
        Self::new(EventStreamFramer, EventStreamDecoder::new(policy))
    }
}

impl<T: DeserializeOwned + 'static> StreamKind<T> {
    /// Newline-delimited JSON documents; blank lines are skipped.
    pub fn json_lines() -> Self {
        Self::new(LineFramer, JsonLinesDecoder::<T>::new())
    }
}

/// Plain text. Accepts any content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl BodyDecoder<String> for TextDecoder {
    fn name(&self) -> &'static str {
        "text"
    }

    fn decode(&self, body: String, _content_type: &ContentType) -> ApiResult<String> {
        Ok(body)
    }
}

impl RecordDecoder<String> for TextDecoder {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn decode(&self, record: &str) -> ApiResult<Option<String>> {
        Ok(Some(record.to_string()))
    }
}

/// Reads and drops the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardDecoder;

impl BodyDecoder<()> for DiscardDecoder {
    fn name(&self) -> &'static str {
        "discard"
    }

    fn decode(&self, _body: String, _content_type: &ContentType) -> ApiResult<()> {
        Ok(())
    }
}

fn accepts_json(content_type: &ContentType) -> bool {
    content_type.is_json() || content_type.is_mime_type("text", "plain")
}

/// JSON body via serde. Accepts JSON media types and `text/plain`.
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> BodyDecoder<T> for JsonDecoder<T> {
    fn name(&self) -> &'static str {
        "json"
    }

    fn accepts(&self, content_type: &ContentType) -> bool {
        accepts_json(content_type)
    }

    fn decode(&self, body: String, _content_type: &ContentType) -> ApiResult<T> {
        Ok(serde_json::from_str(&body)?)
    }
}

/// One JSON document per line.
pub struct JsonLinesDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonLinesDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonLinesDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RecordDecoder<T> for JsonLinesDecoder<T> {
    fn name(&self) -> &'static str {
        "json-lines"
    }

    fn accepts(&self, content_type: &ContentType) -> bool {
        accepts_json(content_type)
            || content_type.is_mime_type("application", "x-ndjson")
            || content_type.is_mime_type("application", "jsonl")
    }

    fn decode(&self, record: &str) -> ApiResult<Option<T>> {
        let record = record.trim();
        if record.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(record)?))
    }
}

/// Event blocks parsed into `EventStream`. Only `text/event-stream` is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStreamDecoder {
    parser: EventStreamParser,
}

impl EventStreamDecoder {
    pub fn new(policy: FieldPolicy) -> Self {
        Self {
            parser: EventStreamParser::new(policy),
        }
    }
}

impl RecordDecoder<EventStream> for EventStreamDecoder {
    fn name(&self) -> &'static str {
        "event-stream"
    }

    fn accepts(&self, content_type: &ContentType) -> bool {
        content_type.is_mime_type(TEXT_EVENT_STREAM.0, TEXT_EVENT_STREAM.1)
    }

    fn decode(&self, record: &str) -> ApiResult<Option<EventStream>> {
        let event = self.parser.parse(record);
        if event.is_none() {
            log::debug!("dropping empty event stream record");
        }
        Ok(event)
    }
}
