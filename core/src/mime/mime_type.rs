/*
 * mime_type.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sigillo.
 *
 * Sigillo is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sigillo is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sigillo.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Body MIME types understood by the send engine.

use std::fmt;

/// Declared type of a draft body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    PlainText,
    Html,
    MultipartMixed,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::PlainText => "text/plain",
            MimeType::Html => "text/html",
            MimeType::MultipartMixed => "multipart/mixed",
        }
    }

    /// Parse a Content-Type value, ignoring parameters and case. None for unsupported types.
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case("text/plain") {
            Some(MimeType::PlainText)
        } else if essence.eq_ignore_ascii_case("text/html") {
            Some(MimeType::Html)
        } else if essence.eq_ignore_ascii_case("multipart/mixed") {
            Some(MimeType::MultipartMixed)
        } else {
            None
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MimeType::PlainText | MimeType::Html)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
