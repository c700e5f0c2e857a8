/*
 * codec.rs
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

//! Session key operations on stored messages: split an armored body, unwrap its session key,
//! and re-wrap a session key for another recipient.

use super::backend::PgpBackend;
use super::error::CryptoError;
use super::keys::{PublicKey, UnlockedKeyRing};
use super::packet::EncryptedSplit;
use super::session_key::SessionKey;

pub struct SessionKeyCodec<'a> {
    backend: &'a dyn PgpBackend,
}

impl<'a> SessionKeyCodec<'a> {
    pub fn new(backend: &'a dyn PgpBackend) -> Self {
        Self { backend }
    }

    /// Split an armored message and unwrap its session key. Returns the key and the data packet.
    pub fn split_and_decrypt_body_key(
        &self,
        armored_body: &str,
        keys: &UnlockedKeyRing,
    ) -> Result<(SessionKey, Vec<u8>), CryptoError> {
        let split = EncryptedSplit::split_armored(armored_body)
            .map_err(|_| CryptoError::SessionKeyDecryptionFailed)?;
        let key = self.decrypt_session_key(&split.key_packet, keys)?;
        Ok((key, split.data_packet))
    }

    pub fn decrypt_session_key(&self, key_packet: &[u8], keys: &UnlockedKeyRing) -> Result<SessionKey, CryptoError> {
        self.backend
            .decrypt_session_key(key_packet, keys)
            .map_err(|_| CryptoError::SessionKeyDecryptionFailed)
    }

    /// Wrap `key` for `recipient`. Each call uses a fresh ephemeral key, so outputs differ.
    pub fn re_encrypt_session_key(&self, key: &SessionKey, recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        self.backend
            .encrypt_session_key(key, recipient)
            .map_err(|e| match e {
                invalid @ CryptoError::RecipientKeyInvalid(_) => invalid,
                other => CryptoError::SessionKeyEncryptionFailed(other.to_string()),
            })
    }

    /// Decrypt a data packet with an already unwrapped session key.
    pub fn decrypt_data(&self, key: &SessionKey, data_packet: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.backend.decrypt_data(key, data_packet)?.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{RpgpBackend, UnlockedPrivateKey};

    #[test]
    fn split_decrypt_and_rewrap() {
        let backend = RpgpBackend::new();
        let codec = SessionKeyCodec::new(&backend);
        let owner = UnlockedPrivateKey::generate("owner@example.com").unwrap();
        let armored = backend
            .encrypt_message(b"draft body", owner.public_key(), None)
            .unwrap()
            .to_armored()
            .unwrap();
        let keys = UnlockedKeyRing::from_keys(vec![owner]).unwrap();

        let (key, data) = codec.split_and_decrypt_body_key(&armored, &keys).unwrap();
        assert_eq!(codec.decrypt_data(&key, &data).unwrap(), b"draft body");

        let friend = UnlockedPrivateKey::generate("friend@example.com").unwrap();
        let packet = codec.re_encrypt_session_key(&key, friend.public_key()).unwrap();
        let again = codec.re_encrypt_session_key(&key, friend.public_key()).unwrap();
        assert_ne!(packet, again);
        let friend_keys = UnlockedKeyRing::from_keys(vec![friend]).unwrap();
        assert_eq!(codec.decrypt_session_key(&packet, &friend_keys).unwrap(), key);
    }

    #[test]
    fn garbage_body_fails_decryption() {
        let backend = RpgpBackend::new();
        let codec = SessionKeyCodec::new(&backend);
        let keys = UnlockedKeyRing::from_keys(vec![UnlockedPrivateKey::generate("a@example.com").unwrap()]).unwrap();
        assert!(matches!(
            codec.split_and_decrypt_body_key("not armored", &keys),
            Err(CryptoError::SessionKeyDecryptionFailed)
        ));
    }

    #[test]
    fn signing_only_certificate_cannot_receive_keys() {
        let backend = RpgpBackend::new();
        let codec = SessionKeyCodec::new(&backend);
        let key = backend.generate_session_key().unwrap();
        let mut cert = UnlockedPrivateKey::generate("signer@example.com")
            .unwrap()
            .public_key()
            .signed()
            .clone();
        cert.public_subkeys.clear();
        let signing_only = PublicKey::from_signed(cert).unwrap();
        assert!(!signing_only.can_encrypt());
        assert!(matches!(
            codec.re_encrypt_session_key(&key, &signing_only),
            Err(CryptoError::RecipientKeyInvalid(_))
        ));
    }
}
