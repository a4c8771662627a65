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

//! Shared test tooling: a scripted in-memory transport and a recording stream callback.

#![allow(dead_code)]

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::Notify;

use netapi_core::api::{SendFuture, StreamCallback, Transport};
use netapi_core::protocol::http::{Response, ResponseHandler};
use netapi_core::{ApiClient, ApiError, ApiRequest, ClientConfig, ContentType};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub enum Step {
    Status(u16, &'static str),
    Header(&'static str, &'static str),
    Body(Vec<u8>),
    /// Block until the gate is notified.
    Wait(Arc<Notify>),
    Complete,
    Fail(io::ErrorKind),
}

/// Replays a fixed sequence of response events for every request and records the requests.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    steps: Vec<Step>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 200 response with the given content type (if any), body chunks, then completion.
    pub fn ok(content_type: Option<&'static str>, chunks: &[&str]) -> Self {
        let mut t = Self::new().status(200, "OK");
        if let Some(ct) = content_type {
            t = t.header("Content-Type", ct);
        }
        for chunk in chunks {
            t = t.body(chunk.as_bytes());
        }
        t.complete()
    }

    pub fn status(mut self, code: u16, reason: &'static str) -> Self {
        self.steps.push(Step::Status(code, reason));
        self
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.steps.push(Step::Header(name, value));
        self
    }

    pub fn body(mut self, bytes: &[u8]) -> Self {
        self.steps.push(Step::Body(bytes.to_vec()));
        self
    }

    pub fn wait(mut self, gate: Arc<Notify>) -> Self {
        self.steps.push(Step::Wait(gate));
        self
    }

    pub fn complete(mut self) -> Self {
        self.steps.push(Step::Complete);
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push(Step::Fail(kind));
        self
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<ApiRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: ApiRequest,
        handler: &'a mut (dyn ResponseHandler + Send),
    ) -> SendFuture<'a> {
        self.requests.lock().unwrap().push(request);
        let steps = self.steps.clone();
        Box::pin(async move {
            let mut body_started = false;
            for step in steps {
                match step {
                    Step::Status(code, reason) => {
                        let response = Response::with_reason(code, reason);
                        if response.is_success() {
                            handler.ok(response);
                        } else {
                            handler.error(response);
                        }
                    }
                    Step::Header(name, value) => handler.header(name, value),
                    Step::Body(bytes) => {
                        if !body_started {
                            handler.start_body();
                            body_started = true;
                        }
                        handler.body_chunk(&bytes);
                        tokio::task::yield_now().await;
                    }
                    Step::Wait(gate) => gate.notified().await,
                    Step::Complete => {
                        if body_started {
                            handler.end_body();
                        }
                        handler.complete();
                    }
                    Step::Fail(kind) => return Err(io::Error::new(kind, "scripted failure")),
                }
            }
            Ok(())
        })
    }
}

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

pub fn client(rt: &Runtime, transport: ScriptedTransport) -> ApiClient {
    client_with(rt, ClientConfig::default(), transport)
}

pub fn client_with(rt: &Runtime, config: ClientConfig, transport: impl Transport + 'static) -> ApiClient {
    ApiClient::with_runtime(config, transport, rt.handle().clone())
}

/// What a stream callback observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen<T> {
    Record(String, T),
    Completed,
    Failed(String),
    Cancelled,
}

/// Stream callback forwarding every event to a channel.
pub struct Recorder<T> {
    tx: Sender<Seen<T>>,
}

impl<T> Recorder<T> {
    pub fn new() -> (Self, Receiver<Seen<T>>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl<T: Clone + Send> StreamCallback<T> for Recorder<T> {
    fn stream(&mut self, content_type: &ContentType, record: &T) {
        let _ = self
            .tx
            .send(Seen::Record(content_type.mime_type(), record.clone()));
    }

    fn completed(&mut self) {
        let _ = self.tx.send(Seen::Completed);
    }

    fn failed(&mut self, error: &ApiError) {
        let _ = self.tx.send(Seen::Failed(error.to_string()));
    }

    fn cancelled(&mut self) {
        let _ = self.tx.send(Seen::Cancelled);
    }
}

/// Everything seen until the terminal event (or until nothing arrives for `WAIT`).
pub fn drain<T>(rx: &Receiver<Seen<T>>) -> Vec<Seen<T>> {
    let mut out = Vec::new();
    while let Ok(seen) = rx.recv_timeout(WAIT) {
        let terminal = !matches!(seen, Seen::Record(..));
        out.push(seen);
        if terminal {
            break;
        }
    }
    out
}

/// Just the records.
pub fn records<T: Clone>(seen: &[Seen<T>]) -> Vec<T> {
    seen.iter()
        .filter_map(|s| match s {
            Seen::Record(_, r) => Some(r.clone()),
            _ => None,
        })
        .collect()
}
