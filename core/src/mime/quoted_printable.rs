/*
 * quoted_printable.rs
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

//! Quoted-Printable Content-Transfer-Encoding (RFC 2045 section 6.7).
//!
//! The encoder emits CRLF hard line breaks for every CRLF or bare LF in the input and inserts
//! `=CRLF` soft breaks so that no encoded line exceeds 76 characters.

/// Maximum encoded line length, including a trailing soft-break `=`.
pub const MAX_LINE_LENGTH: usize = 76;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Encode `input` as quoted-printable.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 8 + 8);
    let mut line_len = 0usize;
    let mut i = 0;

    while i < input.len() {
        let b = input[i];
        if b == b'\r' && input.get(i + 1) == Some(&b'\n') {
            out.extend_from_slice(b"\r\n");
            line_len = 0;
            i += 2;
            continue;
        }
        if b == b'\n' {
            out.extend_from_slice(b"\r\n");
            line_len = 0;
            i += 1;
            continue;
        }

        let literal = match b {
            b' ' | b'\t' => !is_before_line_end(input, i),
            33..=60 | 62..=126 => true,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };
        // Leave room for the '=' of a soft break.
        if line_len + width > MAX_LINE_LENGTH - 1 {
            out.extend_from_slice(b"=\r\n");
            line_len = 0;
        }
        if literal {
            out.push(b);
        } else {
            out.push(b'=');
            out.push(HEX_UPPER[(b >> 4) as usize]);
            out.push(HEX_UPPER[(b & 0x0f) as usize]);
        }
        line_len += width;
        i += 1;
    }
    out
}

/// True when the byte at `i` is the last one before a line break or the end of input.
/// Whitespace in that position must be encoded, since transports may strip it.
fn is_before_line_end(input: &[u8], i: usize) -> bool {
    match input.get(i + 1) {
        None | Some(&b'\n') => true,
        Some(&b'\r') => input.get(i + 2) == Some(&b'\n'),
        _ => false,
    }
}

/// Decode quoted-printable. Handles `=XX` escapes and soft line breaks (`=CRLF`, `=LF`).
/// Malformed escapes are kept literally.
pub fn decode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let b = input[i];
        if b != b'=' {
            out.push(b);
            i += 1;
            continue;
        }
        match (input.get(i + 1), input.get(i + 2)) {
            (Some(&b'\r'), Some(&b'\n')) => i += 3,
            (Some(&b'\n'), _) => i += 2,
            (Some(&hi), Some(&lo)) => match (hex_value(hi), hex_value(lo)) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 3;
                }
                _ => {
                    out.push(b'=');
                    i += 1;
                }
            },
            _ => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escapes_equals_and_high_bytes() {
        assert_eq!(encode("a=b é".as_bytes()), b"a=3Db =C3=A9".to_vec());
    }

    #[test]
    fn trailing_whitespace_is_encoded() {
        assert_eq!(encode(b"end \r\nnext\t"), b"end=20\r\nnext=09".to_vec());
    }

    #[test]
    fn bare_lf_becomes_crlf() {
        assert_eq!(encode(b"one\ntwo"), b"one\r\ntwo".to_vec());
    }

    #[test]
    fn long_line_gets_soft_breaks() {
        let input = vec![b'x'; 200];
        let out = encode(&input);
        assert!(out.windows(3).any(|w| w == b"=\r\n"));
        assert_eq!(decode(&out), input);
    }

    #[test]
    fn decode_keeps_malformed_escape() {
        assert_eq!(decode(b"100=%"), b"100=%".to_vec());
        assert_eq!(decode(b"soft=\nbreak"), b"softbreak".to_vec());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(data in proptest::collection::vec(any::<u8>().prop_filter("no LF", |b| *b != b'\n'), 0..2048)) {
            prop_assert_eq!(decode(&encode(&data)), data);
        }

        #[test]
        fn encoded_lines_fit(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let out = encode(&data);
            for line in out.split(|b| *b == b'\n') {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                prop_assert!(line.len() <= MAX_LINE_LENGTH);
            }
        }
    }
}
