/*
 * consumer.rs
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

//! Response consumers: what happens to decoded text once the response head is known.
//!
//! - `StreamingConsumer`: accumulates text and runs the drain loop after every chunk,
//!   publishing each record as soon as it is framed.
//! - `SingleShotConsumer`: accumulates the whole body and decodes it once.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::api::callback::{FutureCallback, StreamCallback};
use crate::api::decoder::{BodyDecoder, StreamKind};
use crate::api::future::TerminalFlag;
use crate::api::pipeline::ResponseHead;
use crate::error::{ApiError, ApiResult};
use crate::mime::ContentType;

/// Driven by `ResponseAssembler`: `start`, `data` (last call has `end_of_stream`), `build_result`,
/// then one terminal hook, then `release_resources`.
pub trait ResponseConsumer: Send {
    type Output: Send + 'static;

    /// Name of the decoder, for unsupported content type errors.
    fn decoder_name(&self) -> &'static str;

    fn accepts(&self, content_type: &ContentType) -> bool;

    fn start(&mut self, head: &ResponseHead) -> ApiResult<()>;

    fn data(&mut self, text: &str, end_of_stream: bool) -> ApiResult<()>;

    fn build_result(&mut self) -> ApiResult<Self::Output>;

    fn completed(&mut self, _result: &Self::Output) {}

    fn failed(&mut self, _error: &ApiError) {}

    fn cancelled(&mut self) {}

    fn release_resources(&mut self);
}

/// Aggregate of streamed records resolved by the future.
pub trait StreamResult<T>: Default + Send + 'static {
    fn push(&mut self, record: T);
}

/// Every record, in arrival order.
impl<T: Send + 'static> StreamResult<T> for Vec<T> {
    fn push(&mut self, record: T) {
        Vec::push(self, record)
    }
}

/// Callback only; nothing is kept.
impl<T> StreamResult<T> for () {
    fn push(&mut self, _record: T) {}
}

pub struct StreamingConsumer<T, C, R = ()> {
    kind: StreamKind<T>,
    callback: C,
    terminal: TerminalFlag,
    buffer: Option<String>,
    content_type: Option<ContentType>,
    result: R,
}

impl<T, C, R> StreamingConsumer<T, C, R>
where
    T: Send + 'static,
    C: StreamCallback<T>,
    R: StreamResult<T>,
{
    pub fn new(kind: StreamKind<T>, callback: C, terminal: TerminalFlag) -> Self {
        Self {
            kind,
            callback,
            terminal,
            buffer: None,
            content_type: None,
            result: R::default(),
        }
    }

    /// Extract and publish records until the buffer is empty or the framer needs more data.
    fn drain(&mut self, end_of_stream: bool) -> ApiResult<()> {
        let buffer = match self.buffer.as_mut() {
            Some(buffer) => buffer,
            None => return Ok(()),
        };
        let content_type = match self.content_type.as_ref() {
            Some(ct) => ct,
            None => return Err(ApiError::protocol("data before response head")),
        };
        while !buffer.is_empty() {
            if self.terminal.is_set() {
                buffer.clear();
                break;
            }
            let record = match self.kind.extract(buffer, end_of_stream)? {
                Some(record) => record,
                None => break,
            };
            if record.is_stalled() {
                break;
            }
            let n = record.consumed().drain_len(buffer.len());
            if !buffer.is_char_boundary(n) {
                return Err(ApiError::protocol(format!(
                    "{} framer consumed {} bytes, not a character boundary",
                    self.kind.name(),
                    n
                )));
            }
            buffer.drain(..n);
            match record.into_data() {
                Some(data) => {
                    if self.terminal.is_set() {
                        break;
                    }
                    self.callback.stream(content_type, &data);
                    self.result.push(data);
                }
                None => log::debug!("skipping empty {} record", self.kind.name()),
            }
        }
        Ok(())
    }
}

impl<T, C, R> ResponseConsumer for StreamingConsumer<T, C, R>
where
    T: Send + 'static,
    C: StreamCallback<T>,
    R: StreamResult<T>,
{
    type Output = R;

    fn decoder_name(&self) -> &'static str {
        self.kind.name()
    }

    fn accepts(&self, content_type: &ContentType) -> bool {
        self.kind.accepts(content_type)
    }

    fn start(&mut self, head: &ResponseHead) -> ApiResult<()> {
        self.content_type = Some(head.content_type().clone());
        self.buffer = Some(String::new());
        Ok(())
    }

    fn data(&mut self, text: &str, end_of_stream: bool) -> ApiResult<()> {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push_str(text);
        }
        self.drain(end_of_stream)
    }

    fn build_result(&mut self) -> ApiResult<R> {
        Ok(std::mem::take(&mut self.result))
    }

    fn completed(&mut self, _result: &R) {
        self.callback.completed();
    }

    fn failed(&mut self, error: &ApiError) {
        self.callback.failed(error);
    }

    fn cancelled(&mut self) {
        self.callback.cancelled();
    }

    fn release_resources(&mut self) {
        self.buffer = None;
        self.content_type = None;
    }
}

pub struct SingleShotConsumer<T, C = ()> {
    decoder: Arc<dyn BodyDecoder<T>>,
    callback: C,
    buffer: Option<String>,
    content_type: Option<ContentType>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> SingleShotConsumer<T, C>
where
    T: Send + 'static,
    C: FutureCallback<T>,
{
    pub fn new(decoder: Arc<dyn BodyDecoder<T>>, callback: C) -> Self {
        Self {
            decoder,
            callback,
            buffer: None,
            content_type: None,
            _marker: PhantomData,
        }
    }
}

impl<T, C> ResponseConsumer for SingleShotConsumer<T, C>
where
    T: Send + 'static,
    C: FutureCallback<T>,
{
    type Output = T;

    fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    fn accepts(&self, content_type: &ContentType) -> bool {
        self.decoder.accepts(content_type)
    }

    fn start(&mut self, head: &ResponseHead) -> ApiResult<()> {
        self.content_type = Some(head.content_type().clone());
        self.buffer = Some(String::new());
        Ok(())
    }

    fn data(&mut self, text: &str, _end_of_stream: bool) -> ApiResult<()> {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push_str(text);
        }
        Ok(())
    }

    fn build_result(&mut self) -> ApiResult<T> {
        let content_type = self
            .content_type
            .take()
            .ok_or_else(|| ApiError::protocol("response completed before head"))?;
        let body = self.buffer.take().unwrap_or_default();
        self.decoder.decode(body, &content_type)
    }

    fn completed(&mut self, result: &T) {
        self.callback.completed(result);
    }

    fn failed(&mut self, error: &ApiError) {
        self.callback.failed(error);
    }

    fn cancelled(&mut self) {
        self.callback.cancelled();
    }

    fn release_resources(&mut self) {
        self.buffer = None;
        self.content_type = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::decoder::TextDecoder;
    use crate::api::event::{EventStream, FieldPolicy};
    use crate::api::future::Outcome;

    fn head(ct: &str) -> ResponseHead {
        ResponseHead::new(200, None, Vec::new(), ContentType::parse(ct).unwrap())
    }

    #[test]
    fn records_published_per_chunk() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut c: StreamingConsumer<EventStream, _, Vec<EventStream>> = StreamingConsumer::new(
            StreamKind::event_stream(FieldPolicy::Ignore),
            move |_: &ContentType, e: &EventStream| {
                sink.lock().unwrap().push(e.id().unwrap_or("").to_string())
            },
            TerminalFlag::new(),
        );
        c.start(&head("text/event-stream")).unwrap();
        c.data("id:1\nevent:a\ndata:x\n\n", false).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["1"]);
        c.data("id:2\nevent:b\ndata:y\n\n", false).unwrap();
        c.data("", true).unwrap();
        let events = c.build_result().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["1", "2"]);
        assert_eq!(events[1].event(), Some("b"));
        assert_eq!(events[1].data(), Some("y"));
    }

    #[test]
    fn partial_record_waits_for_more() {
        let mut c: StreamingConsumer<String, _, Vec<String>> =
            StreamingConsumer::new(StreamKind::lines(), |_: &ContentType, _: &String| {}, TerminalFlag::new());
        c.start(&head("text/plain")).unwrap();
        c.data("ab", false).unwrap();
        c.data("c\nde", false).unwrap();
        c.data("f", true).unwrap();
        assert_eq!(c.build_result().unwrap(), vec!["abc", "def"]);
    }

    #[test]
    fn nothing_delivered_after_terminal() {
        let flag = TerminalFlag::new();
        let mut c: StreamingConsumer<String, _, Vec<String>> =
            StreamingConsumer::new(StreamKind::lines(), |_: &ContentType, _: &String| {}, flag.clone());
        c.start(&head("text/plain")).unwrap();
        c.data("a\n", false).unwrap();
        assert!(flag.claim(Outcome::Cancelled));
        c.data("b\nc\n", false).unwrap();
        assert_eq!(c.build_result().unwrap(), vec!["a"]);
    }

    #[test]
    fn terminal_claimed_by_callback_stops_same_chunk() {
        let flag = TerminalFlag::new();
        let claimer = flag.clone();
        let mut c: StreamingConsumer<String, _, Vec<String>> = StreamingConsumer::new(
            StreamKind::lines(),
            move |_: &ContentType, _: &String| {
                claimer.claim(Outcome::Cancelled);
            },
            flag.clone(),
        );
        c.start(&head("text/plain")).unwrap();
        c.data("a\nb\nc\n", false).unwrap();
        assert_eq!(c.build_result().unwrap(), vec!["a"]);
    }

    #[test]
    fn single_shot_decodes_at_end() {
        let mut c: SingleShotConsumer<String> = SingleShotConsumer::new(Arc::new(TextDecoder), ());
        c.start(&head("text/plain")).unwrap();
        c.data("o", false).unwrap();
        c.data("k", true).unwrap();
        assert_eq!(c.build_result().unwrap(), "ok");
    }
}
