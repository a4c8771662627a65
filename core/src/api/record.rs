/*
 * record.rs
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

//! One extraction attempt against the accumulated response text.

/// How much of the buffer an extraction accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// Number of bytes from the front of the buffer, delimiter included.
    Bytes(usize),
    /// End of stream: the rest of the buffer, nothing left to retry.
    Rest,
}

impl Consumed {
    /// Signed length: the byte count, or `-1` for `Rest`.
    pub fn as_length(&self) -> i64 {
        match self {
            Consumed::Bytes(n) => *n as i64,
            Consumed::Rest => -1,
        }
    }

    /// Bytes to drop from a buffer of `buffer_len`. A non-positive length drops everything.
    pub fn drain_len(&self, buffer_len: usize) -> usize {
        match self {
            Consumed::Bytes(n) if *n > 0 => (*n).min(buffer_len),
            _ => buffer_len,
        }
    }
}

/// Result of carving one record off the front of the buffer.
///
/// `data` is `None` when the boundary was found but the payload was blank; the caller skips it.
/// A record with no data and no positive length means nothing more can be extracted right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord<T> {
    data: Option<T>,
    consumed: Consumed,
}

impl<T> ResponseRecord<T> {
    pub fn new(data: Option<T>, consumed: Consumed) -> Self {
        Self { data, consumed }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn consumed(&self) -> Consumed {
        self.consumed
    }

    pub fn consumed_length(&self) -> i64 {
        self.consumed.as_length()
    }

    /// True when the record neither carries data nor advances the buffer.
    pub fn is_stalled(&self) -> bool {
        self.data.is_none() && self.consumed == Consumed::Bytes(0)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ResponseRecord<U> {
        ResponseRecord {
            data: self.data.map(f),
            consumed: self.consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_len_clamps() {
        assert_eq!(Consumed::Bytes(2).drain_len(5), 2);
        assert_eq!(Consumed::Bytes(9).drain_len(5), 5);
        assert_eq!(Consumed::Bytes(0).drain_len(5), 5);
        assert_eq!(Consumed::Rest.drain_len(5), 5);
    }

    #[test]
    fn stalled_only_without_data_and_progress() {
        assert!(ResponseRecord::<String>::new(None, Consumed::Bytes(0)).is_stalled());
        assert!(!ResponseRecord::new(Some(1), Consumed::Bytes(0)).is_stalled());
        assert!(!ResponseRecord::<String>::new(None, Consumed::Rest).is_stalled());
        assert_eq!(ResponseRecord::<u8>::new(None, Consumed::Rest).consumed_length(), -1);
    }
}
