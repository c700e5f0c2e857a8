/*
 * builder.rs
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

//! Build the multipart/mixed MIME document sent to PGP/MIME and ClearMime recipients.
//!
//! Layout (all line breaks CRLF):
//! ```text
//! Content-Type: multipart/mixed; boundary=<parameter>
//!
//! <delimiter>
//! Content-Transfer-Encoding: quoted-printable
//! Content-Type: <body type>; charset=utf-8
//!
//! <quoted-printable body>
//! <delimiter>
//! Content-Transfer-Encoding: base64
//! Content-Type: <mime>; filename="=?UTF-8?B?...?="
//! Content-Disposition: attachment; filename="=?UTF-8?B?...?="
//!
//! <base64 lines>
//! <delimiter>--
//! ```

use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::debug;

use super::base64 as mime_base64;
use super::boundary::Boundary;
use super::mime_type::MimeType;
use super::quoted_printable;
use super::rfc2047;

/// Errors from building a MIME document.
#[derive(Debug, Error)]
pub enum MimeBuildError {
    #[error("random source failed: {0}")]
    RandomSourceFailed(String),
    #[error("boundary collided with part content {attempts} times")]
    BoundaryCollision { attempts: usize },
}

/// One attachment offered to the builder. `content` is None when the bytes are not available locally.
#[derive(Debug, Clone, Copy)]
pub struct MimeAttachment<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub content: Option<&'a [u8]>,
}

/// A serialized MIME document and the boundary it uses.
#[derive(Debug, Clone)]
pub struct MimeDocument {
    bytes: Vec<u8>,
    boundary: Boundary,
    part_count: usize,
}

impl MimeDocument {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Number of body parts: the text part plus every attachment that had bytes.
    pub fn part_count(&self) -> usize {
        self.part_count
    }
}

/// Builds multipart/mixed documents. The random source is injected so tests can fix the boundary.
pub struct MimeBodyBuilder<R> {
    rng: R,
    check_collision: bool,
    attempts: usize,
}

impl<R: RngCore + CryptoRng> MimeBodyBuilder<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            check_collision: true,
            attempts: 4,
        }
    }

    /// Enable or disable the boundary/content collision check. `attempts` is clamped to at least 1.
    pub fn with_collision_check(mut self, enabled: bool, attempts: usize) -> Self {
        self.check_collision = enabled;
        self.attempts = attempts.max(1);
        self
    }

    /// Serialize `body` (declared as `body_type`) and the available attachments, in input order.
    /// Attachments without content are skipped.
    pub fn build(
        &mut self,
        body: &[u8],
        body_type: MimeType,
        attachments: &[MimeAttachment<'_>],
    ) -> Result<MimeDocument, MimeBuildError> {
        let mut parts = Vec::with_capacity(attachments.len() + 1);
        parts.push(text_part(body, body_type));
        for att in attachments {
            match att.content {
                Some(content) => parts.push(attachment_part(att, content)),
                None => debug!(attachment = %att.name, "attachment bytes unavailable, omitted from MIME body"),
            }
        }

        let boundary = self.pick_boundary(&parts)?;
        let part_count = parts.len();
        Ok(MimeDocument {
            bytes: assemble(&boundary, &parts),
            boundary,
            part_count,
        })
    }

    fn pick_boundary(&mut self, parts: &[Vec<u8>]) -> Result<Boundary, MimeBuildError> {
        for attempt in 1..=self.attempts {
            let boundary = Boundary::generate(&mut self.rng)
                .map_err(|e| MimeBuildError::RandomSourceFailed(e.to_string()))?;
            if !self.check_collision || !parts.iter().any(|p| boundary.occurs_in(p)) {
                return Ok(boundary);
            }
            debug!(attempt, "boundary found in part content, regenerating");
        }
        Err(MimeBuildError::BoundaryCollision {
            attempts: self.attempts,
        })
    }
}

fn text_part(body: &[u8], body_type: MimeType) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + body.len() / 8 + 96);
    append_header(&mut out, "Content-Transfer-Encoding", "quoted-printable");
    append_header(
        &mut out,
        "Content-Type",
        &format!("{}; charset=utf-8", body_type.as_str()),
    );
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&quoted_printable::encode(body));
    out.extend_from_slice(b"\r\n");
    out
}

fn attachment_part(att: &MimeAttachment<'_>, content: &[u8]) -> Vec<u8> {
    let filename = rfc2047::encode_b(att.name);
    let mut out = Vec::with_capacity(content.len() * 4 / 3 + 256);
    append_header(&mut out, "Content-Transfer-Encoding", "base64");
    append_header(
        &mut out,
        "Content-Type",
        &format!("{}; filename=\"{}\"", att.mime_type, filename),
    );
    append_header(
        &mut out,
        "Content-Disposition",
        &format!("attachment; filename=\"{}\"", filename),
    );
    out.extend_from_slice(b"\r\n");
    // Folded output ends in CRLF, which is the CRLF owed before the next delimiter.
    let encoded = mime_base64::encode_folded(content);
    if encoded.is_empty() {
        out.extend_from_slice(b"\r\n");
    } else {
        out.extend_from_slice(&encoded);
    }
    out
}

fn assemble(boundary: &Boundary, parts: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = parts.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total + (parts.len() + 2) * (boundary.delimiter().len() + 4) + 64);
    append_header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary={}", boundary.parameter()),
    );
    out.extend_from_slice(b"\r\n");
    for part in parts {
        out.extend_from_slice(boundary.delimiter().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(part);
    }
    out.extend_from_slice(boundary.close_delimiter().as_bytes());
    out
}

fn append_header(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::extract::first_text_part;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn builder(seed: u64) -> MimeBodyBuilder<StdRng> {
        MimeBodyBuilder::new(StdRng::seed_from_u64(seed))
    }

    fn count_delimiters(doc: &MimeDocument) -> usize {
        let text = String::from_utf8_lossy(doc.as_bytes()).into_owned();
        text.split("\r\n")
            .filter(|l| *l == doc.boundary().delimiter())
            .count()
    }

    #[test]
    fn structure_with_two_attachments() {
        let pdf = b"%PDF-1.7 fake".to_vec();
        let png = vec![0x89u8, b'P', b'N', b'G'];
        let atts = [
            MimeAttachment { name: "report.pdf", mime_type: "application/pdf", content: Some(&pdf) },
            MimeAttachment { name: "logo.png", mime_type: "image/png", content: Some(&png) },
        ];
        let doc = builder(11).build(b"<p>Hi</p>", MimeType::Html, &atts).unwrap();
        let text = String::from_utf8(doc.as_bytes().to_vec()).unwrap();

        assert!(text.starts_with("Content-Type: multipart/mixed; boundary="));
        assert!(text.ends_with(&doc.boundary().close_delimiter()));
        assert_eq!(doc.part_count(), 3);
        assert_eq!(count_delimiters(&doc), 3);
        assert!(text.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(text.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        let report = rfc2047::encode_b("report.pdf");
        assert!(text.contains(&format!("Content-Type: application/pdf; filename=\"{}\"\r\n", report)));
        assert!(text.contains(&format!("Content-Disposition: attachment; filename=\"{}\"\r\n", report)));
        let pdf_pos = text.find(&report).unwrap();
        let png_pos = text.find(&rfc2047::encode_b("logo.png")).unwrap();
        assert!(pdf_pos < png_pos, "attachments keep input order");
    }

    #[test]
    fn missing_attachment_bytes_are_skipped() {
        let data = b"abc".to_vec();
        let atts = [
            MimeAttachment { name: "gone.bin", mime_type: "application/octet-stream", content: None },
            MimeAttachment { name: "here.bin", mime_type: "application/octet-stream", content: Some(&data) },
        ];
        let doc = builder(5).build(b"body", MimeType::PlainText, &atts).unwrap();
        let text = String::from_utf8(doc.as_bytes().to_vec()).unwrap();
        assert_eq!(doc.part_count(), 2);
        assert_eq!(count_delimiters(&doc), 2);
        assert!(!text.contains(&rfc2047::encode_b("gone.bin")));
        assert!(text.contains(&rfc2047::encode_b("here.bin")));
    }

    #[test]
    fn fixed_seed_is_deterministic_and_fresh_seed_is_not() {
        let a = builder(42).build(b"same", MimeType::PlainText, &[]).unwrap();
        let b = builder(42).build(b"same", MimeType::PlainText, &[]).unwrap();
        let c = builder(43).build(b"same", MimeType::PlainText, &[]).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn text_part_round_trips_through_extract() {
        let body = "Grüße,\nline two with a trailing space \n".as_bytes();
        let doc = builder(9).build(body, MimeType::PlainText, &[]).unwrap();
        let part = first_text_part(doc.as_bytes()).unwrap();
        assert_eq!(part.mime_type, MimeType::PlainText);
        assert_eq!(part.content, "Grüße,\r\nline two with a trailing space \r\n".as_bytes());
    }

    #[test]
    fn collision_is_retried_with_next_boundary() {
        // Body containing the boundary the seed will produce first.
        let first = Boundary::generate(&mut StdRng::seed_from_u64(77)).unwrap();
        let body = format!("look: {}", first.parameter());
        let doc = builder(77).build(body.as_bytes(), MimeType::PlainText, &[]).unwrap();
        assert_ne!(doc.boundary(), &first);

        let doc = builder(77)
            .with_collision_check(false, 1)
            .build(body.as_bytes(), MimeType::PlainText, &[])
            .unwrap();
        assert_eq!(doc.boundary(), &first);
    }

    #[test]
    fn persistent_collision_fails() {
        let first = Boundary::generate(&mut StdRng::seed_from_u64(3)).unwrap();
        let body = format!("{}", first.parameter());
        let err = builder(3)
            .with_collision_check(true, 1)
            .build(body.as_bytes(), MimeType::PlainText, &[])
            .unwrap_err();
        assert!(matches!(err, MimeBuildError::BoundaryCollision { attempts: 1 }));
    }
}
