/*
 * registry.rs
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

//! Requested element type to decoder table.
//!
//! Built while configuring the client and read-only afterwards. Each type may have a single-shot
//! `BodyDecoder` and, independently, a streaming `StreamKind`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::api::decoder::{BodyDecoder, DiscardDecoder, JsonDecoder, StreamKind, TextDecoder};
use crate::api::event::FieldPolicy;

type Entry = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    bodies: HashMap<TypeId, (&'static str, Entry)>,
    streams: HashMap<TypeId, (&'static str, Entry)>,
}

impl Registry {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in decoders: `String`, `serde_json::Value` and `()` bodies; `String` lines and
    /// `EventStream` events.
    pub fn with_builtins(field_policy: FieldPolicy) -> Self {
        let mut registry = Self::new();
        registry
            .register_body::<String>(TextDecoder)
            .register_body::<serde_json::Value>(JsonDecoder::new())
            .register_body::<()>(DiscardDecoder)
            .register_stream(StreamKind::lines())
            .register_stream(StreamKind::event_stream(field_policy));
        registry
    }

    /// Register or replace the single-shot decoder for `T`.
    pub fn register_body<T: 'static>(&mut self, decoder: impl BodyDecoder<T> + 'static) -> &mut Self {
        let decoder: Arc<dyn BodyDecoder<T>> = Arc::new(decoder);
        self.bodies
            .insert(TypeId::of::<T>(), (type_name::<T>(), Box::new(decoder)));
        self
    }

    /// Register or replace the streaming kind for `T`.
    pub fn register_stream<T: 'static>(&mut self, kind: StreamKind<T>) -> &mut Self {
        self.streams
            .insert(TypeId::of::<T>(), (type_name::<T>(), Box::new(kind)));
        self
    }

    /// Decode `T` bodies as JSON.
    pub fn register_json<T: DeserializeOwned + 'static>(&mut self) -> &mut Self {
        self.register_body::<T>(JsonDecoder::<T>::new())
    }

    /// Stream `T` from newline-delimited JSON.
    pub fn register_json_lines<T: DeserializeOwned + 'static>(&mut self) -> &mut Self {
        self.register_stream(StreamKind::<T>::json_lines())
    }

    pub fn body_decoder<T: 'static>(&self) -> Option<Arc<dyn BodyDecoder<T>>> {
        self.bodies
            .get(&TypeId::of::<T>())
            .and_then(|(_, entry)| entry.downcast_ref::<Arc<dyn BodyDecoder<T>>>())
            .cloned()
    }

    pub fn stream_kind<T: 'static>(&self) -> Option<StreamKind<T>> {
        self.streams
            .get(&TypeId::of::<T>())
            .and_then(|(_, entry)| entry.downcast_ref::<StreamKind<T>>())
            .cloned()
    }

    pub fn is_streaming<T: 'static>(&self) -> bool {
        self.streams.contains_key(&TypeId::of::<T>())
    }

    /// Add every entry of `other`, replacing entries for the same type.
    pub fn extend(&mut self, other: Registry) {
        self.bodies.extend(other.bodies);
        self.streams.extend(other.streams);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bodies: Vec<_> = self.bodies.values().map(|(name, _)| *name).collect();
        let mut streams: Vec<_> = self.streams.values().map(|(name, _)| *name).collect();
        bodies.sort_unstable();
        streams.sort_unstable();
        f.debug_struct("Registry")
            .field("bodies", &bodies)
            .field("streams", &streams)
            .finish()
    }
}
