/*
 * preference.rs
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

//! Per-recipient send preferences, supplied by the caller.

use crate::crypto::{CryptoError, PublicKey};
use crate::mime::MimeType;

/// Encoding scheme of a recipient's copy. Codes are the wire bitmask values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageType {
    ProtonMail,
    EncryptedOutside,
    Cleartext,
    PgpInline,
    PgpMime,
    ClearMime,
}

impl PackageType {
    pub fn code(&self) -> u32 {
        match self {
            PackageType::ProtonMail => 1,
            PackageType::EncryptedOutside => 2,
            PackageType::Cleartext => 4,
            PackageType::PgpInline => 8,
            PackageType::PgpMime => 16,
            PackageType::ClearMime => 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPreference {
    pub encrypt: bool,
    pub sign: bool,
    pub pgp_scheme: PackageType,
    pub public_key: Option<PublicKey>,
    pub mime_type: MimeType,
}

impl SendPreference {
    pub fn new(pgp_scheme: PackageType, encrypt: bool, sign: bool) -> Self {
        Self {
            encrypt,
            sign,
            pgp_scheme,
            public_key: None,
            mime_type: MimeType::PlainText,
        }
    }

    pub fn with_public_key(mut self, key: PublicKey) -> Self {
        self.public_key = Some(key);
        self
    }

    /// Attach a public key given in armored form.
    pub fn with_armored_key(self, armored: &str) -> Result<Self, CryptoError> {
        Ok(self.with_public_key(PublicKey::from_armored(armored)?))
    }

    pub fn with_mime_type(mut self, mime_type: MimeType) -> Self {
        self.mime_type = mime_type;
        self
    }
}
