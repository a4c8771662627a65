/*
 * http_integration.rs
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

//! End-to-end tests of the HTTP/1.1 transport against a local server serving canned responses.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use netapi_core::protocol::http::client::HttpClient;
use netapi_core::protocol::http::{Method, Response, ResponseHandler};
use netapi_core::{ApiClient, ApiError, ClientConfig, ContentType, EventStream};

enum Part {
    Bytes(&'static [u8]),
    Wait(Arc<Notify>),
}

/// Accept one connection, read the request, write `parts`, close. Resolves to the raw request.
async fn serve(parts: Vec<Part>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        for part in parts {
            match part {
                Part::Bytes(bytes) => {
                    socket.write_all(bytes).await.unwrap();
                    socket.flush().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Part::Wait(gate) => gate.notified().await,
            }
        }
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{}", addr), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = socket.read(&mut tmp).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8(buf).unwrap()
}

fn bytes(parts: &[&'static [u8]]) -> Vec<Part> {
    parts.iter().map(|p| Part::Bytes(p)).collect()
}

/// ResponseHandler that records all events for inspection.
#[derive(Default)]
struct RecordingResponseHandler {
    status_code: Option<u16>,
    is_success: bool,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    started: bool,
    completed: bool,
    failed: Option<String>,
}

impl ResponseHandler for RecordingResponseHandler {
    fn ok(&mut self, response: Response) {
        self.status_code = Some(response.code);
        self.is_success = true;
    }
    fn error(&mut self, response: Response) {
        self.status_code = Some(response.code);
        self.is_success = false;
    }
    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }
    fn start_body(&mut self) {
        self.started = true;
    }
    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }
    fn end_body(&mut self) {}
    fn complete(&mut self) {
        self.completed = true;
    }
    fn failed(&mut self, error: io::Error) {
        self.failed = Some(error.to_string());
    }
}

#[tokio::test]
async fn connection_reads_content_length_body() {
    let (base, server) = serve(bytes(&[
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhel",
        b"lo",
    ]))
    .await;
    let port: u16 = base.rsplit(':').next().unwrap().parse().unwrap();
    let mut conn = HttpClient::connect("127.0.0.1", port, false).await.unwrap();
    let mut req = conn.request(Method::Get, "/greeting");
    req.header("Accept", "text/plain");
    let mut handler = RecordingResponseHandler::default();
    conn.send(&req, &mut handler).await.unwrap();

    assert_eq!(handler.status_code, Some(200));
    assert!(handler.is_success);
    assert!(handler.started && handler.completed);
    assert!(handler.failed.is_none());
    assert_eq!(handler.body, b"hello");
    assert!(handler
        .headers
        .iter()
        .any(|(k, v)| k == "Content-Type" && v == "text/plain"));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /greeting HTTP/1.1\r\n"));
    assert!(request.contains(&format!("Host: 127.0.0.1:{}\r\n", port)));
    assert!(request.contains("Accept: text/plain\r\n"));
    assert!(request.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn connection_skips_interim_response_and_handles_no_content() {
    let (base, _server) = serve(bytes(&[
        b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 204 No Content\r\nX-Id: 7\r\n\r\n",
    ]))
    .await;
    let port: u16 = base.rsplit(':').next().unwrap().parse().unwrap();
    let mut conn = HttpClient::connect("127.0.0.1", port, false).await.unwrap();
    let req = conn.request(Method::Delete, "/items/7");
    let mut handler = RecordingResponseHandler::default();
    conn.send(&req, &mut handler).await.unwrap();
    assert_eq!(handler.status_code, Some(204));
    assert!(!handler.started);
    assert!(handler.completed);
    assert_eq!(handler.headers, vec![("X-Id".to_string(), "7".to_string())]);
}

#[tokio::test]
async fn connection_eof_before_body_end_is_error() {
    let (base, _server) = serve(bytes(&[
        b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort",
    ]))
    .await;
    let port: u16 = base.rsplit(':').next().unwrap().parse().unwrap();
    let mut conn = HttpClient::connect("127.0.0.1", port, false).await.unwrap();
    let req = conn.request(Method::Get, "/");
    let mut handler = RecordingResponseHandler::default();
    let err = conn.send(&req, &mut handler).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    assert!(!handler.completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chunked_lines_stream() {
    let (base, _server) = serve(bytes(&[
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nTransfer-Encoding: chunked\r\n\r\n",
        b"4\r\none\n\r\n",
        b"3\r\ntwo\r\n",
        b"7\r\n\nthree\n\r\n0\r\n\r\n",
    ]))
    .await;
    let api = ApiClient::new(ClientConfig::builder().base_uri(base).build().unwrap()).unwrap();
    let request = api.get("/lines").unwrap().build().unwrap();
    let lines = api
        .execute_stream_collect::<String, _>(request, |_: &ContentType, _: &String| {})
        .unwrap()
        .await
        .unwrap();
    assert_eq!(lines, vec!["one", "two", "three"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_arrive_before_response_ends() {
    let gate = Arc::new(Notify::new());
    let (base, _server) = serve(vec![
        Part::Bytes(b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\n\r\n"),
        Part::Bytes(b"event: first\ndata: 1\n\n"),
        Part::Wait(gate.clone()),
        Part::Bytes(b"event: second\ndata: 2\n\n"),
    ])
    .await;
    let api = ApiClient::new(ClientConfig::builder().base_uri(base).build().unwrap()).unwrap();
    let request = api.get("/events").unwrap().build().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let future = api
        .execute_stream::<EventStream, _>(request, move |_: &ContentType, e: &EventStream| {
            let _ = tx.send(e.clone());
        })
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_event("first"));
    assert!(!future.is_done());
    gate.notify_one();

    future.await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(second.is_event("second"));
    assert_eq!(second.data(), Some("2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn not_found_fails_with_status() {
    let (base, _server) = serve(bytes(&[
        b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\n\r\nnot found",
    ]))
    .await;
    let api = ApiClient::new(ClientConfig::builder().base_uri(base).build().unwrap()).unwrap();
    let request = api.get("/nope").unwrap().build().unwrap();
    let err = api.execute::<String>(request).unwrap().await.unwrap_err();
    match err {
        ApiError::Response { status, reason } => {
            assert_eq!(status, 404);
            assert_eq!(reason.as_deref(), Some("Not Found"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn body_until_close() {
    let (base, _server) = serve(bytes(&[
        b"HTTP/1.0 200 OK\r\nContent-Type: application/json\r\n\r\n{\"ok\":",
        b"true}",
    ]))
    .await;
    let api = ApiClient::new(ClientConfig::builder().base_uri(base).build().unwrap()).unwrap();
    let request = api.get("/status").unwrap().build().unwrap();
    let value: serde_json::Value = api.execute(request).unwrap().await.unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_sends_content_length_body() {
    let (base, server) = serve(bytes(&[b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n"])).await;
    let api = ApiClient::new(ClientConfig::builder().base_uri(base).build().unwrap()).unwrap();
    let request = api
        .post("/items")
        .unwrap()
        .json(&serde_json::json!({"name": "x"}))
        .bearer_auth("t0k")
        .build()
        .unwrap();
    api.execute::<()>(request).unwrap().await.unwrap();

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /items HTTP/1.1\r\n"));
    assert!(raw.contains("Content-Type: application/json\r\n"));
    assert!(raw.contains("Authorization: Bearer t0k\r\n"));
    assert!(raw.contains("Content-Length: 12\r\n"));
    assert!(raw.ends_with("\r\n\r\n{\"name\":\"x\"}"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = ApiClient::new(ClientConfig::default()).unwrap();
    let request = api
        .get(&format!("http://{}/", addr))
        .unwrap()
        .build()
        .unwrap();
    let err = api.execute::<String>(request).unwrap().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
