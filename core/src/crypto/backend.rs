/*
 * backend.rs
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

//! The cryptographic operations the send engine needs, as a trait so the engine does not depend
//! on one implementation.

use super::error::CryptoError;
use super::keys::{PublicKey, UnlockedKeyRing, UnlockedPrivateKey};
use super::packet::{EncryptedSplit, LiteralData};
use super::session_key::SessionKey;

/// Primitive operations plus composed message helpers.
///
/// Key and data packets are exchanged as binary OpenPGP packets (see [`super::packet`]).
pub trait PgpBackend: Send + Sync {
    fn generate_session_key(&self) -> Result<SessionKey, CryptoError>;

    /// Wrap `key` for `recipient`. Returns one public-key encrypted session key packet.
    fn encrypt_session_key(&self, key: &SessionKey, recipient: &PublicKey) -> Result<Vec<u8>, CryptoError>;

    /// Unwrap the first session key packet in `key_packets` that a key in `keys` opens.
    fn decrypt_session_key(&self, key_packets: &[u8], keys: &UnlockedKeyRing) -> Result<SessionKey, CryptoError>;

    /// Encrypt `content` under `key` as a data packet carrying literal name `name`, signed by
    /// `signer` when given.
    fn encrypt_data(
        &self,
        key: &SessionKey,
        name: &str,
        content: &[u8],
        signer: Option<&UnlockedPrivateKey>,
    ) -> Result<Vec<u8>, CryptoError>;

    fn decrypt_data(&self, key: &SessionKey, data_packet: &[u8]) -> Result<LiteralData, CryptoError>;

    /// Detached binary signature packet over `data`.
    fn sign_detached(&self, data: &[u8], signer: &UnlockedPrivateKey) -> Result<Vec<u8>, CryptoError>;

    fn verify_detached(&self, data: &[u8], signature: &[u8], signer: &PublicKey) -> Result<(), CryptoError>;

    /// Encrypt `plaintext` for `recipient` under a fresh session key, optionally signing it.
    fn encrypt_message(
        &self,
        plaintext: &[u8],
        recipient: &PublicKey,
        signer: Option<&UnlockedPrivateKey>,
    ) -> Result<EncryptedSplit, CryptoError> {
        let key = self.generate_session_key()?;
        let data_packet = self.encrypt_data(&key, "", plaintext, signer)?;
        let key_packet = self.encrypt_session_key(&key, recipient)?;
        Ok(EncryptedSplit {
            key_packet,
            data_packet,
        })
    }

    fn encrypt_and_sign(
        &self,
        plaintext: &[u8],
        recipient: &PublicKey,
        signer: &UnlockedPrivateKey,
    ) -> Result<EncryptedSplit, CryptoError> {
        self.encrypt_message(plaintext, recipient, Some(signer))
    }

    fn decrypt_message(&self, split: &EncryptedSplit, keys: &UnlockedKeyRing) -> Result<LiteralData, CryptoError> {
        let key = self.decrypt_session_key(&split.key_packet, keys)?;
        self.decrypt_data(&key, &split.data_packet)
    }

    /// Decrypt and check the embedded signature against `signer`.
    fn decrypt_and_verify(
        &self,
        split: &EncryptedSplit,
        keys: &UnlockedKeyRing,
        signer: &PublicKey,
    ) -> Result<LiteralData, CryptoError> {
        let literal = self.decrypt_message(split, keys)?;
        let signature = literal.signature.as_deref().ok_or(CryptoError::SignatureInvalid)?;
        self.verify_detached(&literal.content, signature, signer)?;
        Ok(literal)
    }
}
