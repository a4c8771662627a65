/*
 * connection.rs
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

//! HTTP connection: one TCP or TLS stream, drives the HTTP/1.1 parser, invokes ResponseHandler.

use bytes::BytesMut;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream as TokioTlsStream;

use crate::protocol::http::h1::{H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::request::{Method, RequestBuilder};
use crate::protocol::http::response::Response;
use crate::protocol::http::ResponseHandler;

const READ_CHUNK: usize = 8192;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Bridges H1 parser callbacks to the connection state and user's ResponseHandler.
struct H1Driver<'a> {
    status: &'a mut Option<(u16, Option<String>)>,
    headers: &'a mut Vec<(String, String)>,
    handler: &'a mut (dyn ResponseHandler + Send),
}

impl H1ResponseHandler for H1Driver<'_> {
    fn status(&mut self, code: u16, reason: Option<&str>) {
        *self.status = Some((code, reason.map(|s| s.to_string())));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn start_body(&mut self) {
        self.handler.start_body();
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.handler.body_chunk(data);
    }

    fn end_body(&mut self) {
        self.handler.end_body();
    }

    fn trailer(&mut self, name: &str, value: &str) {
        self.handler.header(name, value);
    }

    fn complete(&mut self) {
        self.handler.complete();
    }
}

/// HTTP/1.1 connection: holds the stream and drives the read loop. Call send() to issue a request.
pub struct HttpConnection {
    stream: HttpStream,
    host: String,
    port: u16,
    secure: bool,
    read_buf: BytesMut,
    parser: ResponseParser,
    status: Option<(u16, Option<String>)>,
    headers: Vec<(String, String)>,
}

impl HttpConnection {
    /// Create from an already-connected stream. Used by HttpClient::connect().
    pub fn new(stream: HttpStream, host: String, port: u16, secure: bool) -> Self {
        Self {
            stream,
            host,
            port,
            secure,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: ResponseParser::new(),
            status: None,
            headers: Vec::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Build a request (method, path). Use send() to execute it with a handler.
    pub fn request(&mut self, method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path.into())
    }

    /// Send the request and run the read loop until the response is complete. Handler is invoked as data arrives.
    /// I/O and protocol errors are returned; calling `handler.failed` is left to the caller.
    pub async fn send(
        &mut self,
        request: &RequestBuilder,
        handler: &mut (dyn ResponseHandler + Send),
    ) -> io::Result<()> {
        self.status = None;
        self.headers.clear();
        self.parser.reset();
        self.read_buf.clear();

        self.write_request(request).await?;
        let head_request = request.method == Method::Head;

        let mut tmp = [0u8; READ_CHUNK];
        loop {
            self.drive(handler, head_request)?;
            if self.parser.state() == ParseState::Idle {
                return Ok(());
            }
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                let mut driver = H1Driver {
                    status: &mut self.status,
                    headers: &mut self.headers,
                    handler,
                };
                return self.parser.finish_at_eof(&mut driver);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }

    /// Feed buffered bytes to the parser. Dispatches status and headers once the head is complete,
    /// then picks the body mode and keeps parsing whatever already followed the head.
    fn drive(&mut self, handler: &mut (dyn ResponseHandler + Send), head_request: bool) -> io::Result<()> {
        loop {
            let mut driver = H1Driver {
                status: &mut self.status,
                headers: &mut self.headers,
                handler: &mut *handler,
            };
            self.parser.receive(&mut self.read_buf, &mut driver)?;
            if self.parser.state() != ParseState::HeadersComplete {
                return Ok(());
            }

            let (code, reason) = self.status.take().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "headers without status line")
            })?;
            let response = match reason {
                Some(r) => Response::with_reason(code, r),
                None => Response::new(code),
            };
            // Interim response (100 Continue, 103 Early Hints): the final one follows.
            if (100..200).contains(&code) && code != 101 {
                log::trace!("skipping interim response {}", code);
                self.headers.clear();
                self.parser.reset();
                continue;
            }

            let content_length = header_value(&self.headers, "content-length")
                .map(|v| {
                    v.trim().parse::<u64>().map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, format!("invalid Content-Length: {}", v))
                    })
                })
                .transpose()?;
            let chunked = self.headers.iter().any(|(k, v)| {
                k.eq_ignore_ascii_case("transfer-encoding") && v.to_ascii_lowercase().contains("chunked")
            });
            let bodiless = head_request
                || response.is_bodiless()
                || (!chunked && content_length == Some(0));

            if response.is_success() {
                handler.ok(response);
            } else {
                handler.error(response);
            }
            for (name, value) in &self.headers {
                handler.header(name, value);
            }

            if bodiless {
                let mut driver = H1Driver {
                    status: &mut self.status,
                    headers: &mut self.headers,
                    handler: &mut *handler,
                };
                self.parser.finish_without_body(&mut driver);
                return Ok(());
            }
            handler.start_body();
            self.parser.set_body_mode(content_length, chunked);
        }
    }

    async fn write_request(&mut self, request: &RequestBuilder) -> io::Result<()> {
        let mut req = format!("{} {} HTTP/1.1\r\n", request.method.as_str(), request.path);
        if !request.has_header("Host") {
            let host = if self.host.contains(':') {
                format!("[{}]", self.host)
            } else {
                self.host.clone()
            };
            let default_port = if self.secure { 443 } else { 80 };
            if self.port == default_port {
                req.push_str(&format!("Host: {}\r\n", host));
            } else {
                req.push_str(&format!("Host: {}:{}\r\n", host, self.port));
            }
        }
        for (k, v) in &request.headers {
            req.push_str(k);
            req.push_str(": ");
            req.push_str(v);
            req.push_str("\r\n");
        }
        if !request.has_header("Connection") {
            req.push_str("Connection: close\r\n");
        }
        if let Some(body) = &request.body {
            if !request.has_header("Content-Length") {
                req.push_str(&format!("Content-Length: {}\r\n", body.len()));
            }
        }
        req.push_str("\r\n");
        log::trace!("{} {} {}:{}", request.method, request.path, self.host, self.port);
        self.stream.write_all(req.as_bytes()).await?;
        if let Some(body) = &request.body {
            self.stream.write_all(body).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }

}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
