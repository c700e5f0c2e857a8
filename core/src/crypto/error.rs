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

//! Errors from the cryptographic layer. OpenPGP library errors are carried as their message text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("failed to generate session key: {0}")]
    SessionKeyGenerationFailed(String),
    #[error("no unlocked key can decrypt the session key")]
    SessionKeyDecryptionFailed,
    #[error("failed to encrypt session key: {0}")]
    SessionKeyEncryptionFailed(String),
    #[error("invalid recipient public key: {0}")]
    RecipientKeyInvalid(String),
    #[error("data encryption failed: {0}")]
    DataEncryptionFailed(String),
    #[error("data decryption failed: {0}")]
    DataDecryptionFailed(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("signature does not verify")]
    SignatureInvalid,
    #[error("malformed packet: {0}")]
    MalformedPacket(String),
    #[error("malformed armor: {0}")]
    MalformedArmor(String),
    #[error("invalid private key: {0}")]
    PrivateKeyInvalid(String),
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),
    #[error("failed to protect private key: {0}")]
    KeyProtectionFailed(String),
    #[error("no private key could be unlocked")]
    KeyUnlockFailed,
    #[error("key ring has no primary key")]
    NoPrimaryKey,
}
