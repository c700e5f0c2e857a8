/*
 * attachment.rs
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

//! Per-attachment encryption: fresh session key, key packet to the sender, data packet, and a
//! detached signature over the plaintext.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::crypto::{CryptoError, PgpBackend, UnlockedPrivateKey};

use super::error::{SendError, SendResult};

#[derive(Debug, Error)]
pub enum AttachmentEncryptionError {
    #[error("failed to generate session key: {0}")]
    FailedToGenerateSessionKey(#[source] CryptoError),
    #[error("failed to encrypt session key: {0}")]
    FailedToEncryptSessionKey(#[source] CryptoError),
    #[error("failed to encrypt attachment: {0}")]
    FailedToEncryptAttachment(#[source] CryptoError),
    #[error("failed to sign attachment: {0}")]
    FailedToSignAttachment(#[source] CryptoError),
}

impl AttachmentEncryptionError {
    /// Pipeline error for attachment `id`. Signing failures keep their own variant.
    pub fn into_send_error(self, id: &str) -> SendError {
        match self {
            AttachmentEncryptionError::FailedToSignAttachment(source) => SendError::AttachmentSigningFailed {
                id: id.to_string(),
                source,
            },
            other => SendError::AttachmentEncryptionFailed {
                id: id.to_string(),
                source: other,
            },
        }
    }
}

/// Upload payload for one attachment. All three parts are binary OpenPGP packets.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedAttachment {
    pub key_packet: Vec<u8>,
    pub encrypted_attachment: Vec<u8>,
    pub signature: Vec<u8>,
}

impl fmt::Debug for EncryptedAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedAttachment")
            .field("key_packet", &self.key_packet.len())
            .field("encrypted_attachment", &self.encrypted_attachment.len())
            .field("signature", &self.signature.len())
            .finish()
    }
}

/// Plaintext attachment handed to [`AttachmentEncryptor::encrypt_all`].
#[derive(Debug, Clone, Copy)]
pub struct AttachmentSource<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub content: &'a [u8],
}

pub struct AttachmentEncryptor<'a> {
    backend: &'a dyn PgpBackend,
}

impl<'a> AttachmentEncryptor<'a> {
    pub fn new(backend: &'a dyn PgpBackend) -> Self {
        Self { backend }
    }

    /// Encrypt one attachment to `sender`'s own key and sign the plaintext. Any failing step aborts.
    pub fn encrypt_and_sign(
        &self,
        sender: &UnlockedPrivateKey,
        content: &[u8],
        filename: &str,
    ) -> Result<EncryptedAttachment, AttachmentEncryptionError> {
        let key = self
            .backend
            .generate_session_key()
            .map_err(AttachmentEncryptionError::FailedToGenerateSessionKey)?;
        let key_packet = self
            .backend
            .encrypt_session_key(&key, sender.public_key())
            .map_err(AttachmentEncryptionError::FailedToEncryptSessionKey)?;
        let encrypted_attachment = self
            .backend
            .encrypt_data(&key, filename, content, None)
            .map_err(AttachmentEncryptionError::FailedToEncryptAttachment)?;
        let signature = self
            .backend
            .sign_detached(content, sender)
            .map_err(AttachmentEncryptionError::FailedToSignAttachment)?;
        Ok(EncryptedAttachment {
            key_packet,
            encrypted_attachment,
            signature,
        })
    }

    /// Encrypt every attachment in parallel. The first failure in input order is returned.
    pub fn encrypt_all(
        &self,
        sender: &UnlockedPrivateKey,
        sources: &[AttachmentSource<'_>],
    ) -> SendResult<BTreeMap<String, EncryptedAttachment>> {
        let results: Vec<_> = sources
            .par_iter()
            .map(|s| (s.id, self.encrypt_and_sign(sender, s.content, s.name)))
            .collect();
        let mut out = BTreeMap::new();
        for (id, result) in results {
            let encrypted = result.map_err(|e| e.into_send_error(id))?;
            debug!(attachment = %id, bytes = encrypted.encrypted_attachment.len(), "attachment encrypted");
            out.insert(id.to_string(), encrypted);
        }
        Ok(out)
    }
}
