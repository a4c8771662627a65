/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked, or until close).

use bytes::Buf;
use bytes::BytesMut;
use std::io;

/// Callback for HTTP/1.1 response events. Connection implements this and forwards to ResponseHandler.
pub trait H1ResponseHandler {
    fn status(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn start_body(&mut self);
    fn body_chunk(&mut self, data: &[u8]);
    fn end_body(&mut self);
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    StatusLine,
    Headers,
    /// Headers done; connection must call `set_body_mode()` or `finish_without_body()`.
    HeadersComplete,
    Body,
    ChunkSize,
    ChunkData,
    ChunkTrailer,
}

/// Push parser for HTTP/1.1 response. Feed bytes via `receive`; handler is invoked as complete tokens are parsed.
pub struct ResponseParser {
    state: ParseState,
    /// Content-Length when known; `None` for chunked or read-until-close.
    content_length: Option<u64>,
    bytes_received: u64,
    /// Remaining bytes of the current chunk (for chunked encoding).
    chunk_remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            content_length: None,
            bytes_received: 0,
            chunk_remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.content_length = None;
        self.bytes_received = 0;
        self.chunk_remaining = 0;
    }

    /// True when the body has neither Content-Length nor chunked framing; EOF ends it.
    pub fn is_reading_until_close(&self) -> bool {
        self.state == ParseState::Body && self.content_length.is_none()
    }

    /// Find CRLF in buf; return number of bytes to the start of CRLF, or None if not found.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    fn line_str(line: &[u8], what: &str) -> io::Result<String> {
        std::str::from_utf8(line)
            .map(str::to_string)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("invalid {} UTF-8", what)))
    }

    /// Consume and parse as much as possible from buf. Handler is called for each complete token.
    /// Partial data remains in buf. Returns on `HeadersComplete` so the caller can choose the body mode.
    pub fn receive<H: H1ResponseHandler>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), io::Error> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = Self::line_str(&line[..line_end], "status line")?;
                    // HTTP/1.1 200 OK or HTTP/1.1 200
                    let mut parts = line_str.splitn(3, ' ');
                    let version = parts.next().unwrap_or("");
                    if !version.starts_with("HTTP/") {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("invalid status line: {}", line_str),
                        ));
                    }
                    let code = parts
                        .next()
                        .and_then(|s| s.parse::<u16>().ok())
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("invalid status code: {}", line_str),
                            )
                        })?;
                    let reason = parts.next().map(str::trim).filter(|s| !s.is_empty());
                    handler.status(code, reason);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    let line = buf.split_to(line_end + 2);
                    let line_str = Self::line_str(&line[..line_end], "header")?;
                    if let Some((name, value)) = line_str.split_once(':') {
                        handler.header(name.trim(), value.trim());
                    }
                }
                ParseState::Body => {
                    if let Some(content_length) = self.content_length {
                        let remaining = content_length - self.bytes_received;
                        let to_read = usize::try_from(remaining).unwrap_or(usize::MAX).min(buf.len());
                        if to_read > 0 {
                            let chunk = buf.split_to(to_read);
                            handler.body_chunk(&chunk);
                            self.bytes_received += to_read as u64;
                        }
                        if self.bytes_received >= content_length {
                            handler.end_body();
                            handler.complete();
                            self.state = ParseState::Idle;
                        }
                    } else {
                        // Read until close: deliver all available; the connection signals the end on EOF.
                        let chunk = buf.split_to(buf.len());
                        handler.body_chunk(&chunk);
                        return Ok(());
                    }
                }
                ParseState::ChunkSize => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = Self::line_str(&line[..line_end], "chunk size")?;
                    let hex_part = line_str.split(';').next().unwrap_or(&line_str).trim();
                    self.chunk_remaining = parse_chunk_size(hex_part).ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("invalid chunk size: {}", hex_part),
                        )
                    })?;
                    self.state = if self.chunk_remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let to_read = usize::try_from(self.chunk_remaining)
                        .unwrap_or(usize::MAX)
                        .min(buf.len());
                    if to_read > 0 {
                        let chunk = buf.split_to(to_read);
                        handler.body_chunk(&chunk);
                        self.chunk_remaining -= to_read as u64;
                    }
                    if self.chunk_remaining > 0 {
                        return Ok(());
                    }
                    // Trailing CRLF after chunk data
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        handler.end_body();
                        handler.complete();
                        self.state = ParseState::Idle;
                    } else {
                        let line = buf.split_to(line_end + 2);
                        let line_str = Self::line_str(&line[..line_end], "trailer")?;
                        if let Some((name, value)) = line_str.split_once(':') {
                            handler.trailer(name.trim(), value.trim());
                        }
                    }
                }
                ParseState::HeadersComplete | ParseState::Idle => return Ok(()),
            }
        }
        Ok(())
    }

    /// Called by the connection after headers are received (state HeadersComplete), after handler.start_body().
    pub fn set_body_mode(&mut self, content_length: Option<u64>, chunked: bool) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        self.bytes_received = 0;
        if chunked {
            self.content_length = None;
            self.state = ParseState::ChunkSize;
        } else {
            self.content_length = content_length;
            self.state = ParseState::Body;
        }
    }

    /// Called by the connection for responses that carry no body (204, 304, HEAD, Content-Length: 0).
    pub fn finish_without_body<H: H1ResponseHandler>(&mut self, handler: &mut H) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        handler.complete();
        self.state = ParseState::Idle;
    }

    /// EOF while reading until close ends the body.
    pub fn finish_at_eof<H: H1ResponseHandler>(&mut self, handler: &mut H) -> io::Result<()> {
        if self.is_reading_until_close() {
            handler.end_body();
            handler.complete();
            self.state = ParseState::Idle;
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "HTTP connection closed before response completed",
            ))
        }
    }
}

/// Chunk size line: hex digits only, no sign or prefix.
fn parse_chunk_size(hex: &str) -> Option<u64> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
