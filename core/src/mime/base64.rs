/*
 * base64.rs
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

//! Base64 Content-Transfer-Encoding (RFC 2045): line-folded encoder and lenient decoder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Maximum encoded line length, excluding the CRLF.
pub const LINE_LENGTH: usize = 76;

/// Encode `data` as base64 folded into CRLF-terminated lines of at most 76 characters.
/// Empty input yields empty output (no blank line).
pub fn encode_folded(data: &[u8]) -> Vec<u8> {
    let encoded = STANDARD.encode(data);
    let mut out = Vec::with_capacity(encoded.len() + (encoded.len() / LINE_LENGTH + 1) * 2);
    for line in encoded.as_bytes().chunks(LINE_LENGTH) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Decode base64, skipping whitespace and line breaks. None if the remaining input is not valid base64.
pub fn decode_lenient(data: &[u8]) -> Option<Vec<u8>> {
    let compact: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(&compact).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_at_76_columns() {
        let data = vec![0xabu8; 200];
        let out = encode_folded(&data);
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.ends_with("\r\n"));
        for line in text.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= LINE_LENGTH);
        }
        assert_eq!(decode_lenient(&out).unwrap(), data);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(encode_folded(b"").is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_lenient(b"not*base64").is_none());
    }
}
