/*
 * error.rs
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

//! API client errors.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::mime::ContentType;

/// Boxed cause carried by protocol and decode errors.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors surfaced by `ApiClient::execute*` and by `ResponseFuture`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid argument detected before any network activity (missing decoder, bad URI, ...).
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// Response status indicates failure. Raised before any record of that response is streamed.
    #[error("{}", status_message(.status, .reason))]
    Response { status: u16, reason: Option<String> },

    /// Malformed response or request.
    #[error("protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The response content type is not one the selected decoder accepts.
    #[error("Unsupported Content-Type: {content_type} for {decoder}")]
    UnsupportedContentType {
        content_type: ContentType,
        decoder: &'static str,
    },

    /// A framer or decoder failed on a specific record; the rest of the stream is abandoned.
    #[error("decode failed: {0}")]
    Decode(#[source] BoxError),

    /// I/O failure in the transport (connect, read, write, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("request cancelled")]
    Cancelled,

    /// `ResponseFuture::get_timeout` elapsed before the response completed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub type ApiResult<T> = Result<T, ApiError>;

fn status_message(status: &u16, reason: &Option<String>) -> String {
    match reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => format!("status code: {}, reason phrase: {}", status, r),
        None => format!("status code: {}", status),
    }
}

impl ApiError {
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::Parameter(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol {
            message: msg.into(),
            source: None,
        }
    }

    pub fn decode(cause: impl Into<BoxError>) -> Self {
        Self::Decode(cause.into())
    }

    /// Status code for `Response` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_message_with_and_without_reason() {
        let e = ApiError::Response {
            status: 404,
            reason: Some("Not Found".into()),
        };
        assert_eq!(e.to_string(), "status code: 404, reason phrase: Not Found");
        let e = ApiError::Response {
            status: 500,
            reason: Some("  ".into()),
        };
        assert_eq!(e.to_string(), "status code: 500");
        assert_eq!(e.status(), Some(500));
    }

    #[test]
    fn decode_keeps_cause() {
        let cause = io::Error::new(io::ErrorKind::InvalidData, "bad record");
        let e = ApiError::decode(cause);
        let source = e.source().expect("source");
        assert_eq!(source.to_string(), "bad record");
    }

    #[test]
    fn unsupported_content_type_message() {
        let ct = ContentType::parse("text/plain; charset=UTF-8").unwrap();
        let e = ApiError::UnsupportedContentType {
            content_type: ct,
            decoder: "event-stream",
        };
        assert_eq!(
            e.to_string(),
            "Unsupported Content-Type: text/plain; charset=UTF-8 for event-stream"
        );
    }
}
