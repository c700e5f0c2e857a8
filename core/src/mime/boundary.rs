/*
 * boundary.rs
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

//! Multipart boundary generation (RFC 2046) from an injected random source.

use rand::{CryptoRng, RngCore};

/// Dash run in front of the random part. The first two dashes are the delimiter prefix,
/// so the `boundary=` parameter starts with the remaining 21.
const DASH_RUN: &str = "-----------------------";

/// Random bytes per boundary (rendered as 32 lowercase hex chars).
pub const BOUNDARY_RANDOM_BYTES: usize = 16;

/// A generated multipart boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    delimiter: String,
}

impl Boundary {
    /// Draw 16 bytes from `rng` and build `<dash run><hex32>`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, rand::Error> {
        let mut bytes = [0u8; BOUNDARY_RANDOM_BYTES];
        rng.try_fill_bytes(&mut bytes)?;
        let mut delimiter = String::with_capacity(DASH_RUN.len() + BOUNDARY_RANDOM_BYTES * 2);
        delimiter.push_str(DASH_RUN);
        for b in bytes {
            delimiter.push_str(&format!("{:02x}", b));
        }
        Ok(Self { delimiter })
    }

    /// Delimiter line that opens each body part (`--` + parameter).
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Value for the `boundary=` Content-Type parameter.
    pub fn parameter(&self) -> &str {
        &self.delimiter[2..]
    }

    /// Close delimiter that ends the multipart body.
    pub fn close_delimiter(&self) -> String {
        format!("{}--", self.delimiter)
    }

    /// True when the boundary parameter appears anywhere in `content`.
    pub fn occurs_in(&self, content: &[u8]) -> bool {
        let needle = self.parameter().as_bytes();
        content.windows(needle.len()).any(|w| w == needle)
    }
}

/// Checks if a character is valid in a MIME boundary (RFC 2046 bchars).
#[inline]
fn is_boundary_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' |
        b'/' | b':' | b'=' | b'?'
    )
}

/// Validates a boundary parameter: 1-70 chars from the boundary set.
pub(crate) fn is_valid_boundary(boundary: &str) -> bool {
    let b = boundary.as_bytes();
    (1..=70).contains(&b.len()) && b.iter().copied().all(is_boundary_char)
}
