/*
 * event.rs
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

//! Server-Sent Events envelope: one `text/event-stream` block parsed into named fields.
//!
//! Lines are split once on the first `:`; exactly one leading space of the value is dropped.
//! `event`, `id` and `retry` are last-write-wins, `data` lines accumulate joined by `\n`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// What to do with a field name other than `event`, `data`, `id` or `retry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Log and skip the line.
    #[default]
    Ignore,
    /// Treat the whole line as a continuation of `data`.
    AppendToData,
}

/// One parsed event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventStream {
    event: Option<String>,
    data: Option<String>,
    id: Option<String>,
    /// Reconnection time in milliseconds.
    retry: Option<u64>,
}

impl EventStream {
    /// Event type; listeners dispatch on it. `None` means a plain message.
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn retry(&self) -> Option<u64> {
        self.retry
    }

    pub fn is_event(&self, name: &str) -> bool {
        self.event.as_deref() == Some(name)
    }

    /// Deserialize `data` as JSON. Missing data decodes as an empty document (and fails).
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_str(self.data.as_deref().unwrap_or(""))?)
    }

    fn push_data(&mut self, value: &str) {
        match &mut self.data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
    }
}

struct Quoted<'a>(Option<&'a str>);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(s) => write!(f, "'{}'", s),
            None => f.write_str("null"),
        }
    }
}

impl fmt::Display for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let retry = self.retry.map(|r| r.to_string());
        write!(
            f,
            "EventStream[event={}, data={}, id={}, retry={}]",
            Quoted(self.event()),
            Quoted(self.data()),
            Quoted(self.id()),
            Quoted(retry.as_deref())
        )
    }
}

/// Parses event blocks (the text between blank lines) with a fixed unknown-field policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStreamParser {
    policy: FieldPolicy,
}

impl EventStreamParser {
    pub fn new(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Parse one block. `None` when no field was set, so the block is dropped.
    pub fn parse(&self, block: &str) -> Option<EventStream> {
        if block.trim().is_empty() {
            return None;
        }
        let mut event = EventStream::default();
        let mut fields = 0usize;
        for line in block.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            let (name, value) = match line.split_once(':') {
                Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match name {
                "" => log::trace!("event stream comment: {}", value),
                "event" => {
                    event.event = Some(value.to_string());
                    fields += 1;
                }
                "data" => {
                    event.push_data(value);
                    fields += 1;
                }
                "id" => {
                    event.id = Some(value.to_string());
                    fields += 1;
                }
                "retry" => match value.trim().parse::<u64>() {
                    Ok(retry) => {
                        event.retry = Some(retry);
                        fields += 1;
                    }
                    Err(e) => log::warn!("ignoring event stream retry {:?}: {}", value, e),
                },
                _ => match self.policy {
                    FieldPolicy::Ignore => log::debug!("ignoring event stream field: {}", line),
                    FieldPolicy::AppendToData => {
                        if !line.trim().is_empty() {
                            event.push_data(line);
                            fields += 1;
                        }
                    }
                },
            }
        }
        if fields == 0 {
            None
        } else {
            Some(event)
        }
    }
}
