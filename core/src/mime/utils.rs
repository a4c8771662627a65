/*
 * utils.rs
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

//! Token grammar shared by media types and header parameters (RFC 9110 §5.6.2).

/// Checks if a byte is a `tchar`.
#[inline]
pub fn is_token_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~'
    )
}

/// Checks if the string is a valid token (1+ tchars).
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_rejects_separators() {
        assert!(is_token("event-stream"));
        assert!(is_token("UTF-8"));
        assert!(!is_token("a b"));
        assert!(!is_token("a/b"));
        assert!(!is_token("{x}"));
        assert!(!is_token(""));
    }
}
