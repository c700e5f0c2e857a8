/*
 * writer.rs
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

//! Compact streaming JSON writer for the send payload. Output accumulates in a BytesMut.

use bytes::{BufMut, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,      // nothing written at this level yet
    AfterValue, // a value was written, next one needs a comma
    AfterKey,   // key and colon written, value follows directly
}

/// Writes one JSON document. Callers are responsible for balancing start/end calls.
pub struct JsonWriter {
    buf: BytesMut,
    state: State,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            state: State::Start,
        }
    }

    pub fn buffer(&self) -> &BytesMut {
        &self.buf
    }

    /// Take the finished document, leaving the writer empty for reuse.
    pub fn take_buffer(&mut self) -> BytesMut {
        self.state = State::Start;
        std::mem::take(&mut self.buf)
    }

    fn before_value(&mut self) {
        if self.state == State::AfterValue {
            self.buf.put_u8(b',');
        }
    }

    pub fn write_start_object(&mut self) {
        self.before_value();
        self.buf.put_u8(b'{');
        self.state = State::Start;
    }

    pub fn write_end_object(&mut self) {
        self.buf.put_u8(b'}');
        self.state = State::AfterValue;
    }

    pub fn write_start_array(&mut self) {
        self.before_value();
        self.buf.put_u8(b'[');
        self.state = State::Start;
    }

    pub fn write_end_array(&mut self) {
        self.buf.put_u8(b']');
        self.state = State::AfterValue;
    }

    pub fn write_key(&mut self, key: &str) {
        self.before_value();
        write_escaped_string(&mut self.buf, key);
        self.buf.put_u8(b':');
        self.state = State::AfterKey;
    }

    pub fn write_string(&mut self, value: &str) {
        self.before_value();
        write_escaped_string(&mut self.buf, value);
        self.state = State::AfterValue;
    }

    pub fn write_u64(&mut self, value: u64) {
        self.before_value();
        self.buf.put_slice(value.to_string().as_bytes());
        self.state = State::AfterValue;
    }

    pub fn write_bool(&mut self, value: bool) {
        self.before_value();
        self.buf.put_slice(if value { &b"true"[..] } else { &b"false"[..] });
        self.state = State::AfterValue;
    }

    pub fn write_null(&mut self) {
        self.before_value();
        self.buf.put_slice(b"null");
        self.state = State::AfterValue;
    }

    /// Shorthand for a `"key":"value"` member.
    pub fn write_string_field(&mut self, key: &str, value: &str) {
        self.write_key(key);
        self.write_string(value);
    }

    /// Shorthand for a `"key":n` member.
    pub fn write_u64_field(&mut self, key: &str, value: u64) {
        self.write_key(key);
        self.write_u64(value);
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_escaped_string(buf: &mut BytesMut, s: &str) {
    buf.put_u8(b'"');
    let mut utf8 = [0u8; 4];
    for ch in s.chars() {
        match ch {
            '"' => buf.put_slice(b"\\\""),
            '\\' => buf.put_slice(b"\\\\"),
            '\u{8}' => buf.put_slice(b"\\b"),
            '\u{c}' => buf.put_slice(b"\\f"),
            '\n' => buf.put_slice(b"\\n"),
            '\r' => buf.put_slice(b"\\r"),
            '\t' => buf.put_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                buf.put_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => buf.put_slice(c.encode_utf8(&mut utf8).as_bytes()),
        }
    }
    buf.put_u8(b'"');
}
