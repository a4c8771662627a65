/*
 * content_type.rs
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

//! Content-Type header (RFC 9110 media type: `type/subtype; name=value`).

use std::fmt;

use super::utils::is_token;

pub const TEXT_PLAIN: (&str, &str) = ("text", "plain");
pub const TEXT_EVENT_STREAM: (&str, &str) = ("text", "event-stream");
pub const APPLICATION_JSON: (&str, &str) = ("application", "json");
pub const APPLICATION_FORM_URLENCODED: (&str, &str) = ("application", "x-www-form-urlencoded");

/// Parsed media type. Parameter names are lower-cased; order is preserved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    primary_type: String,
    sub_type: String,
    parameters: Vec<(String, String)>,
}

impl ContentType {
    pub fn new(primary_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            primary_type: primary_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Parse a header value; `None` if it is not `token/token[; params]`.
    pub fn parse(value: &str) -> Option<Self> {
        parse_content_type(value)
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// `type/subtype` without parameters.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.primary_type, self.sub_type)
    }

    pub fn is_mime_type(&self, primary: &str, sub: &str) -> bool {
        self.primary_type.eq_ignore_ascii_case(primary) && self.sub_type.eq_ignore_ascii_case(sub)
    }

    /// True for `application/json` and structured-syntax `*/*+json` types.
    pub fn is_json(&self) -> bool {
        self.is_mime_type(APPLICATION_JSON.0, APPLICATION_JSON.1)
            || self.sub_type.to_ascii_lowercase().ends_with("+json")
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.parameters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Add or replace a parameter.
    pub fn with_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((name, value)),
        }
        self
    }

    pub fn with_charset(self, charset: &str) -> Self {
        self.with_parameter("charset", charset)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary_type, self.sub_type)?;
        for (name, value) in &self.parameters {
            if is_token(value) {
                write!(f, "; {}={}", name, value)?;
            } else {
                write!(f, "; {}=\"{}\"", name, value.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// Parse Content-Type header value.
pub fn parse_content_type(value: &str) -> Option<ContentType> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (type_part, params_part) = match value.find(';') {
        Some(i) => {
            let (a, b) = value.split_at(i);
            (a.trim(), b[1..].trim())
        }
        None => (value, ""),
    };
    let slash = type_part.find('/')?;
    let primary = type_part[..slash].trim();
    let sub = type_part[slash + 1..].trim();
    if !is_token(primary) || !is_token(sub) {
        return None;
    }
    let mut content_type = ContentType::new(primary.to_ascii_lowercase(), sub.to_ascii_lowercase());
    for (name, value) in parse_parameter_list(params_part) {
        content_type = content_type.with_parameter(&name, value);
    }
    Some(content_type)
}

/// Parse semicolon-separated parameter list (name=value; name="value"). Malformed entries are skipped.
pub fn parse_parameter_list(params_part: &str) -> Vec<(String, String)> {
    let mut parameters = Vec::new();
    let bytes = params_part.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let eq = match bytes[pos..].iter().position(|&b| b == b'=') {
            Some(eq) => pos + eq,
            None => break,
        };
        let name = String::from_utf8_lossy(&bytes[pos..eq]).trim().to_string();
        if !is_token(&name) {
            match bytes[pos..].iter().position(|&b| b == b';') {
                Some(semi) => {
                    pos += semi + 1;
                    continue;
                }
                None => break,
            }
        }
        pos = eq + 1;
        let value = if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut v = Vec::new();
            while pos < len {
                let c = bytes[pos];
                if c == b'\\' && pos + 1 < len {
                    v.push(bytes[pos + 1]);
                    pos += 2;
                } else if c == b'"' {
                    pos += 1;
                    break;
                } else {
                    v.push(c);
                    pos += 1;
                }
            }
            String::from_utf8_lossy(&v).into_owned()
        } else {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| pos + i)
                .unwrap_or(len);
            let v = String::from_utf8_lossy(&bytes[pos..end]).trim().to_string();
            pos = end;
            if !is_token(&v) {
                continue;
            }
            v
        };
        parameters.push((name, value));
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_charset() {
        let ct = ContentType::parse("text/event-stream; charset=UTF-8").unwrap();
        assert!(ct.is_mime_type("text", "event-stream"));
        assert_eq!(ct.charset(), Some("UTF-8"));
        assert_eq!(ct.to_string(), "text/event-stream; charset=UTF-8");
    }

    #[test]
    fn parse_quoted_parameter() {
        let ct = ContentType::parse("multipart/form-data; boundary=\"a b\"").unwrap();
        assert_eq!(ct.parameter("BOUNDARY"), Some("a b"));
        assert_eq!(ct.to_string(), "multipart/form-data; boundary=\"a b\"");
    }

    #[test]
    fn with_charset_replaces() {
        let ct = ContentType::parse("text/plain;charset=iso-8859-1")
            .unwrap()
            .with_charset("UTF-8");
        assert_eq!(ct.to_string(), "text/plain; charset=UTF-8");
    }

    #[test]
    fn json_detection() {
        assert!(ContentType::parse("application/json").unwrap().is_json());
        assert!(ContentType::parse("application/problem+json").unwrap().is_json());
        assert!(!ContentType::parse("text/plain").unwrap().is_json());
    }

    #[test]
    fn rejects_garbage() {
        assert!(ContentType::parse("").is_none());
        assert!(ContentType::parse("nonsense").is_none());
        assert!(ContentType::parse("a b/c").is_none());
    }
}
