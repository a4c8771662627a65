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

//! Media types for HTTP entities.

mod content_type;
mod utils;

pub use content_type::{
    parse_content_type, parse_parameter_list, ContentType, APPLICATION_FORM_URLENCODED,
    APPLICATION_JSON, TEXT_EVENT_STREAM, TEXT_PLAIN,
};
pub use utils::{is_token, is_token_char};
