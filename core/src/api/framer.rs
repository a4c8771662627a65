/*
 * framer.rs
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

//! Record boundaries in accumulated response text.

use crate::api::record::{Consumed, ResponseRecord};
use crate::error::ApiResult;

/// Finds the next complete record at the front of `buffer`.
///
/// Must be free of side effects: the same buffer and flag always give the same answer.
/// `Ok(None)` means more data is needed.
pub trait Framer: Send + Sync {
    fn extract(&self, buffer: &str, end_of_stream: bool) -> ApiResult<Option<ResponseRecord<String>>>;
}

/// Shared boundary search: record up to `delimiter`, or the blank-filtered remainder at end of stream.
fn extract_delimited(
    buffer: &str,
    end_of_stream: bool,
    delimiter: &str,
) -> Option<ResponseRecord<String>> {
    match buffer.find(delimiter) {
        Some(i) => Some(ResponseRecord::new(
            Some(buffer[..i].to_string()),
            Consumed::Bytes(i + delimiter.len()),
        )),
        None if end_of_stream => {
            let data = if buffer.trim().is_empty() {
                None
            } else {
                Some(buffer.to_string())
            };
            Some(ResponseRecord::new(data, Consumed::Rest))
        }
        None => None,
    }
}

/// One record per `\n`-terminated line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFramer;

impl Framer for LineFramer {
    fn extract(&self, buffer: &str, end_of_stream: bool) -> ApiResult<Option<ResponseRecord<String>>> {
        Ok(extract_delimited(buffer, end_of_stream, "\n"))
    }
}

/// One record per blank-line-terminated block (`text/event-stream`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStreamFramer;

impl Framer for EventStreamFramer {
    fn extract(&self, buffer: &str, end_of_stream: bool) -> ApiResult<Option<ResponseRecord<String>>> {
        Ok(extract_delimited(buffer, end_of_stream, "\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(framer: &dyn Framer, buf: &mut String, eos: bool) -> Option<ResponseRecord<String>> {
        let record = framer.extract(buf, eos).unwrap()?;
        let n = record.consumed().drain_len(buf.len());
        buf.drain(..n);
        Some(record)
    }

    #[test]
    fn lines_in_sequence() {
        let mut buf = "a\nb\nc".to_string();
        let r = take(&LineFramer, &mut buf, false).unwrap();
        assert_eq!((r.data().map(String::as_str), r.consumed_length()), (Some("a"), 2));
        let r = take(&LineFramer, &mut buf, false).unwrap();
        assert_eq!((r.data().map(String::as_str), r.consumed_length()), (Some("b"), 2));
        assert!(take(&LineFramer, &mut buf, false).is_none());
        let r = take(&LineFramer, &mut buf, true).unwrap();
        assert_eq!((r.data().map(String::as_str), r.consumed_length()), (Some("c"), -1));
        assert!(buf.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        for eos in [false, true] {
            let buf = "x\ny";
            assert_eq!(
                LineFramer.extract(buf, eos).unwrap(),
                LineFramer.extract(buf, eos).unwrap()
            );
            assert_eq!(
                EventStreamFramer.extract(buf, eos).unwrap(),
                EventStreamFramer.extract(buf, eos).unwrap()
            );
        }
    }

    #[test]
    fn blank_tail_has_no_data() {
        let r = LineFramer.extract("  \t", true).unwrap().unwrap();
        assert_eq!(r.data(), None);
        assert_eq!(r.consumed(), Consumed::Rest);
    }

    #[test]
    fn event_blocks() {
        let r = EventStreamFramer
            .extract("data: 1\n\ndata: 2", false)
            .unwrap()
            .unwrap();
        assert_eq!(r.data().map(String::as_str), Some("data: 1"));
        assert_eq!(r.consumed_length(), 9);
        assert!(EventStreamFramer.extract("data: 2\n", false).unwrap().is_none());
        let r = EventStreamFramer.extract("data: 2\n", true).unwrap().unwrap();
        assert_eq!(r.data().map(String::as_str), Some("data: 2\n"));
    }

    #[test]
    fn multibyte_offsets_are_bytes() {
        let r = LineFramer.extract("中文\nx", false).unwrap().unwrap();
        assert_eq!(r.consumed_length(), 7);
    }
}
