/*
 * rfc2047.rs
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

//! RFC 2047 encoded-words: B-encoding for outbound filename parameters, decoding for inbound values.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::mime::base64 as mime_base64;
use crate::mime::quoted_printable;

/// Encode `text` as a single UTF-8 B encoded-word: `=?UTF-8?B?<base64>?=`.
/// Always encodes, even pure ASCII, so the value never needs quoting rules of its own.
pub fn encode_b(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Expand every encoded-word in `s`. Text that only looks like the start of one is kept literally.
pub fn decode_encoded_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("=?") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match decode_one(candidate) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push_str("=?");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the encoded-word at the start of `word`. Returns the text and the number of bytes consumed.
fn decode_one(word: &str) -> Option<(String, usize)> {
    let inner = word.strip_prefix("=?")?;
    let mut fields = inner.splitn(3, '?');
    let charset = fields.next()?;
    let encoding = fields.next()?;
    let tail = fields.next()?;
    if charset.is_empty() {
        return None;
    }
    let end = tail.find("?=")?;
    let payload = &tail[..end];
    let bytes = match encoding {
        "B" | "b" => mime_base64::decode_lenient(payload.as_bytes())?,
        "Q" | "q" => decode_q(payload.as_bytes()),
        _ => return None,
    };
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((charset_to_string(&bytes, charset), consumed))
}

/// Q encoding: `_` is a space, everything else is quoted-printable.
fn decode_q(payload: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = payload
        .iter()
        .map(|&b| if b == b'_' { b' ' } else { b })
        .collect();
    quoted_printable::decode(&spaced)
}

fn charset_to_string(bytes: &[u8], charset: &str) -> String {
    match charset.trim().to_ascii_lowercase().as_str() {
        "iso-8859-1" | "latin1" | "iso_8859-1" => bytes.iter().map(|&b| b as char).collect(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
