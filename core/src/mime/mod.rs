/*
 * mod.rs
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

//! MIME encoding for outbound bodies: boundary generation, quoted-printable and base64 transfer
//! encodings, RFC 2047 filenames, the multipart/mixed builder, and text-part extraction from drafts.

pub mod base64;
mod boundary;
mod builder;
mod extract;
mod mime_type;
pub mod quoted_printable;
pub mod rfc2047;

pub use boundary::{Boundary, BOUNDARY_RANDOM_BYTES};
pub use builder::{MimeAttachment, MimeBodyBuilder, MimeBuildError, MimeDocument};
pub use extract::{first_text_part, TextPart};
pub use mime_type::MimeType;
