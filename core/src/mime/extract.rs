/*
 * extract.rs
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

//! Pull the first text body part out of a multipart/mixed document (drafts stored as MIME).

use tracing::debug;

use super::base64 as mime_base64;
use super::boundary::is_valid_boundary;
use super::mime_type::MimeType;
use super::quoted_printable;

/// Multipart nesting deeper than this is not searched.
const MAX_DEPTH: u32 = 256;

/// Decoded text part: its own declared type and content with transfer encoding removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    pub mime_type: MimeType,
    pub content: Vec<u8>,
}

/// Find the first text/plain or text/html part of a multipart document.
/// A document whose top-level type is already text is returned as-is (decoded).
pub fn first_text_part(document: &[u8]) -> Option<TextPart> {
    text_part_at(document, 0)
}

fn text_part_at(document: &[u8], depth: u32) -> Option<TextPart> {
    let lines = split_lines(document);
    let (headers, body_start) = parse_headers(&lines);
    let content_type = header_value(&headers, "content-type").unwrap_or("text/plain");

    let declared = MimeType::parse(content_type)?;
    if declared.is_text() {
        let encoding = header_value(&headers, "content-transfer-encoding");
        let body = join_lines(&lines[body_start..]);
        return Some(TextPart {
            mime_type: declared,
            content: decode_transfer(&body, encoding)?,
        });
    }

    if depth >= MAX_DEPTH {
        debug!(depth, "multipart nesting too deep, not searched");
        return None;
    }
    let boundary = parameter(content_type, "boundary").filter(|b| is_valid_boundary(b))?;
    let open = format!("--{}", boundary);
    let close = format!("--{}--", boundary);

    let mut part: Option<Vec<&[u8]>> = None;
    for &line in &lines[body_start..] {
        let trimmed = trim_end(line);
        if trimmed == open.as_bytes() || trimmed == close.as_bytes() {
            if let Some(found) = part.take().and_then(|p| text_part_at(&join_lines(&p), depth + 1)) {
                return Some(found);
            }
            if trimmed == close.as_bytes() {
                return None;
            }
            part = Some(Vec::new());
        } else if let Some(ref mut p) = part {
            p.push(line);
        }
    }
    None
}

fn decode_transfer(body: &[u8], encoding: Option<&str>) -> Option<Vec<u8>> {
    match encoding.map(|e| e.trim().to_ascii_lowercase()) {
        Some(e) if e == "quoted-printable" => Some(quoted_printable::decode(body)),
        Some(e) if e == "base64" => mime_base64::decode_lenient(body),
        _ => Some(body.to_vec()),
    }
}

/// Split on LF, dropping a trailing CR from each line.
fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = data
        .split(|&b| b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .collect();
    if data.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

fn join_lines(lines: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(line);
    }
    out
}

fn trim_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Parse the header block (with folded continuation lines). Returns lowercased names
/// and the index of the first body line.
fn parse_headers(lines: &[&[u8]]) -> (Vec<(String, String)>, usize) {
    let mut headers: Vec<(String, String)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            return (headers, i + 1);
        }
        let text = String::from_utf8_lossy(line);
        if line[0] == b' ' || line[0] == b'\t' {
            if let Some(last) = headers.last_mut() {
                last.1.push(' ');
                last.1.push_str(text.trim());
            }
            continue;
        }
        if let Some((name, value)) = text.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    (headers, lines.len())
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Parameter value from a `type/sub; name=value; name="value"` header.
fn parameter(value: &str, name: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|p| {
        let (n, v) = p.split_once('=')?;
        if n.trim().eq_ignore_ascii_case(name) {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_html_part() {
        let doc = b"Content-Type: multipart/mixed; boundary=\"abc\"\r\n\r\n\
preamble\r\n\
--abc\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
<p>caf=C3=A9</p>\r\n\
--abc\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
iVBORw0K\r\n\
--abc--\r\n";
        let part = first_text_part(doc).unwrap();
        assert_eq!(part.mime_type, MimeType::Html);
        assert_eq!(part.content, "<p>café</p>".as_bytes());
    }

    #[test]
    fn skips_non_text_parts() {
        let doc = b"Content-Type: multipart/mixed; boundary=b1\n\n\
--b1\n\
Content-Type: application/pdf\n\
\n\
%PDF\n\
--b1\n\
Content-Type: text/plain\n\
Content-Transfer-Encoding: base64\n\
\n\
aGVsbG8=\n\
--b1--\n";
        let part = first_text_part(doc).unwrap();
        assert_eq!(part.mime_type, MimeType::PlainText);
        assert_eq!(part.content, b"hello");
    }

    #[test]
    fn no_text_part() {
        let doc = b"Content-Type: multipart/mixed; boundary=z\r\n\r\n--z\r\nContent-Type: image/gif\r\n\r\nGIF\r\n--z--\r\n";
        assert!(first_text_part(doc).is_none());
    }

    #[test]
    fn invalid_boundary_is_not_split() {
        let doc = b"Content-Type: multipart/mixed; boundary=\"x{y}\"\r\n\r\n--x{y}\r\nContent-Type: text/plain\r\n\r\nhi\r\n--x{y}--\r\n";
        assert!(first_text_part(doc).is_none());
    }

    /// Text part wrapped in `levels` multipart containers.
    fn nested(levels: u32) -> Vec<u8> {
        let mut doc = b"Content-Type: text/plain\r\n\r\ndeep".to_vec();
        for i in 0..levels {
            let mut outer =
                format!("Content-Type: multipart/mixed; boundary=\"b{}\"\r\n\r\n--b{}\r\n", i, i).into_bytes();
            outer.extend_from_slice(&doc);
            outer.extend_from_slice(format!("\r\n--b{}--\r\n", i).as_bytes());
            doc = outer;
        }
        doc
    }

    #[test]
    fn nested_text_part_is_found() {
        let part = first_text_part(&nested(8)).unwrap();
        assert_eq!(part.content, b"deep");
        assert!(first_text_part(&nested(MAX_DEPTH)).is_some());
    }

    #[test]
    fn nesting_past_limit_gives_up() {
        assert!(first_text_part(&nested(MAX_DEPTH + 1)).is_none());
    }
}
