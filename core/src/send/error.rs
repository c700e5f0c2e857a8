/*
 * error.rs
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

//! Errors surfaced by the send pipeline.

use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::CryptoError;
use crate::mime::MimeBuildError;

use super::attachment::AttachmentEncryptionError;
use super::sink::SinkError;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to decrypt session key: {0}")]
    SessionKeyDecryptionFailed(#[source] CryptoError),
    #[error("failed to decrypt draft body: {0}")]
    BodyDecryptionFailed(String),
    #[error("failed to encrypt MIME body: {0}")]
    MimeBodyEncryptionFailed(#[source] CryptoError),
    #[error("attachment {0} has no key packet")]
    AttachmentKeyPacketMissing(String),
    #[error("attachment {id}: {source}")]
    AttachmentEncryptionFailed {
        id: String,
        #[source]
        source: AttachmentEncryptionError,
    },
    #[error("attachment {id}: signing failed: {source}")]
    AttachmentSigningFailed {
        id: String,
        #[source]
        source: CryptoError,
    },
    #[error("recipient {0} has no usable public key")]
    RecipientPublicKeyMissing(String),
    #[error("no encrypted MIME body for recipient {0}")]
    RecipientEncryptedBodyMissing(String),
    #[error("generated packages cover {generated} of {expected} recipients")]
    PackageGenerationFailed { expected: usize, generated: usize },
    #[error(transparent)]
    MimeBuildFailed(#[from] MimeBuildError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type SendResult<T> = Result<T, SendError>;
