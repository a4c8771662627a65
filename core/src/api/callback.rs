/*
 * callback.rs
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

//! Caller-supplied callbacks.

use crate::error::ApiError;
use crate::mime::ContentType;

/// Receives streamed records as they are decoded, then exactly one terminal event.
///
/// Records arrive in the order they were framed from the body. A failure or cancellation hook
/// may follow records already delivered; those stay valid.
pub trait StreamCallback<T>: Send {
    fn stream(&mut self, content_type: &ContentType, record: &T);

    fn completed(&mut self) {}

    /// Receives the same error value that resolves the future.
    fn failed(&mut self, _error: &ApiError) {}

    fn cancelled(&mut self) {}
}

impl<T, F> StreamCallback<T> for F
where
    F: FnMut(&ContentType, &T) + Send,
{
    fn stream(&mut self, content_type: &ContentType, record: &T) {
        self(content_type, record)
    }
}

/// Terminal hooks for single-shot requests, run before the future resolves.
pub trait FutureCallback<T>: Send {
    fn completed(&mut self, result: &T);

    fn failed(&mut self, _error: &ApiError) {}

    fn cancelled(&mut self) {}
}

/// No callback.
impl<T> FutureCallback<T> for () {
    fn completed(&mut self, _result: &T) {}
}
