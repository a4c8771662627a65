/*
 * pipeline.rs
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

//! Response pipeline: transport callbacks in, consumer calls and a resolved future out.
//!
//! `ResponseAssembler` collects status and headers until the body starts, then fixes the response
//! head: failure statuses abort before the consumer sees anything, the effective content type and
//! charset are settled, and the consumer's decoder is checked against the content type. Body bytes
//! are decoded incrementally so multi-byte characters may straddle chunks.

use std::io;
use std::sync::Arc;

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::api::consumer::ResponseConsumer;
use crate::api::future::{Outcome, Shared};
use crate::config::{ClientConfig, ContentTypePolicy};
use crate::error::{ApiError, ApiResult};
use crate::mime::{ContentType, TEXT_PLAIN};
use crate::protocol::http::{Response, ResponseHandler};

/// Reconstructed view of the response as handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: u16,
    reason: Option<String>,
    headers: Vec<(String, String)>,
    content_type: ContentType,
}

impl ResponseHead {
    pub fn new(
        status: u16,
        reason: Option<String>,
        headers: Vec<(String, String)>,
        content_type: ContentType,
    ) -> Self {
        Self {
            status,
            reason,
            headers,
            content_type,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with this name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Content type after charset coercion.
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }
}

/// Effective content type and decoding charset for a response.
///
/// No header gives `text/plain` in the configured charset; a header without a charset, or with one
/// that is not recognised, gets the configured charset added.
pub fn effective_content_type(
    header: Option<&str>,
    configured: &'static Encoding,
) -> (ContentType, &'static Encoding) {
    let declared = match header {
        Some(value) => match ContentType::parse(value) {
            Some(ct) => ct,
            None => {
                log::warn!("unparseable Content-Type {:?}, using {}", value, TEXT_PLAIN.1);
                return plain(configured);
            }
        },
        None => return plain(configured),
    };
    let label = declared.charset().map(str::to_string);
    match label {
        None => (declared.with_charset(configured.name()), configured),
        Some(label) => match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) => (declared, encoding),
            None => {
                log::warn!("unknown charset {:?}, decoding as {}", label, configured.name());
                (declared.with_charset(configured.name()), configured)
            }
        },
    }
}

fn plain(charset: &'static Encoding) -> (ContentType, &'static Encoding) {
    (
        ContentType::new(TEXT_PLAIN.0, TEXT_PLAIN.1).with_charset(charset.name()),
        charset,
    )
}

/// Streaming charset decoder.
struct TextDecoder {
    decoder: Decoder,
}

impl TextDecoder {
    fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
        }
    }

    /// Decode `bytes`; incomplete trailing sequences are held until the next call or `last`.
    fn decode(&mut self, mut bytes: &[u8], last: bool) -> String {
        let mut out = String::new();
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(bytes.len())
                .unwrap_or(bytes.len().saturating_mul(3).saturating_add(16));
            out.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(bytes, &mut out, last);
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

/// Adapts `ResponseHandler` events from the transport to a `ResponseConsumer` and resolves the
/// request's future.
pub struct ResponseAssembler<C: ResponseConsumer> {
    consumer: C,
    shared: Arc<Shared<C::Output>>,
    config: Arc<ClientConfig>,
    status: Option<Response>,
    headers: Vec<(String, String)>,
    text: Option<TextDecoder>,
    started: bool,
    finished: bool,
}

impl<C: ResponseConsumer> ResponseAssembler<C> {
    pub(crate) fn new(consumer: C, shared: Arc<Shared<C::Output>>, config: Arc<ClientConfig>) -> Self {
        Self {
            consumer,
            shared,
            config,
            status: None,
            headers: Vec::new(),
            text: None,
            started: false,
            finished: false,
        }
    }

    pub(crate) fn shared(&self) -> Arc<Shared<C::Output>> {
        Arc::clone(&self.shared)
    }

    /// Settle the head once. False when the response was aborted.
    fn begin(&mut self) -> bool {
        if self.finished {
            return false;
        }
        if self.started {
            return true;
        }
        self.started = true;
        match self.start_consumer() {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn start_consumer(&mut self) -> ApiResult<()> {
        let status = self
            .status
            .take()
            .ok_or_else(|| ApiError::protocol("response body before status line"))?;
        log::trace!(
            "response: {} {}",
            status.code,
            status.reason.as_deref().unwrap_or("")
        );
        if status.code >= 300 {
            return Err(ApiError::Response {
                status: status.code,
                reason: status.reason,
            });
        }
        let header = self
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str());
        let (content_type, encoding) = effective_content_type(header, self.config.charset());
        if !self.consumer.accepts(&content_type) {
            match self.config.content_type_policy() {
                ContentTypePolicy::Reject => {
                    return Err(ApiError::UnsupportedContentType {
                        content_type,
                        decoder: self.consumer.decoder_name(),
                    })
                }
                ContentTypePolicy::Coerce => log::warn!(
                    "decoding {} with {} decoder",
                    content_type,
                    self.consumer.decoder_name()
                ),
            }
        }
        self.text = Some(TextDecoder::new(encoding));
        let head = ResponseHead::new(
            status.code,
            status.reason,
            std::mem::take(&mut self.headers),
            content_type,
        );
        self.consumer.start(&head)
    }

    fn push(&mut self, bytes: &[u8], end_of_stream: bool) {
        let text = match self.text.as_mut() {
            Some(decoder) => decoder.decode(bytes, end_of_stream),
            None => String::new(),
        };
        if let Err(e) = self.consumer.data(&text, end_of_stream) {
            self.fail(e);
        }
    }

    fn succeed(&mut self) {
        if self.finished {
            return;
        }
        match self.consumer.build_result() {
            Ok(result) => {
                self.finished = true;
                if self.shared.claim(Outcome::Completed) {
                    self.consumer.completed(&result);
                    self.consumer.release_resources();
                    self.shared.resolve(Ok(result));
                } else {
                    self.lost_race();
                }
            }
            Err(e) => self.fail(e),
        }
    }

    /// Abort with `error`. The consumer's failure hook sees the value the future then resolves with.
    pub fn fail(&mut self, error: ApiError) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.shared.claim(Outcome::Failed) {
            log::debug!("request failed: {}", error);
            self.consumer.failed(&error);
            self.consumer.release_resources();
            self.shared.resolve(Err(error));
        } else {
            self.lost_race();
        }
    }

    /// Another terminal signal got there first; only a cancellation still owes the consumer its hook.
    fn lost_race(&mut self) {
        if self.shared.is_cancelled() {
            self.consumer.cancelled();
        }
        self.consumer.release_resources();
    }

    /// The transport returned without reporting completion or failure.
    pub(crate) fn finish_unterminated(&mut self) {
        if !self.finished {
            self.fail(ApiError::protocol("response ended without completion"));
        }
    }
}

impl<C: ResponseConsumer> ResponseHandler for ResponseAssembler<C> {
    fn ok(&mut self, response: Response) {
        if !self.started {
            self.status = Some(response);
            self.headers.clear();
        }
    }

    fn error(&mut self, response: Response) {
        self.ok(response);
    }

    fn header(&mut self, name: &str, value: &str) {
        // Trailers after the body are not part of the head.
        if !self.started {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }

    fn start_body(&mut self) {
        self.begin();
    }

    fn body_chunk(&mut self, data: &[u8]) {
        if self.begin() {
            self.push(data, false);
        }
    }

    fn end_body(&mut self) {
        self.begin();
    }

    fn complete(&mut self) {
        if !self.begin() {
            return;
        }
        self.push(&[], true);
        self.succeed();
    }

    fn failed(&mut self, error: io::Error) {
        self.fail(ApiError::Transport(error));
    }

    fn cancelled(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.shared.claim(Outcome::Cancelled) {
            self.consumer.cancelled();
            self.consumer.release_resources();
            self.shared.resolve(Err(ApiError::Cancelled));
        } else {
            self.lost_race();
        }
    }
}
