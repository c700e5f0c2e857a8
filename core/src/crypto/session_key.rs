/*
 * session_key.rs
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

//! Symmetric session keys. One per body, MIME body and attachment, never persisted.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use zeroize::Zeroizing;

use super::error::CryptoError;

/// Symmetric cipher a session key is used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymmetricAlgorithm {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl SymmetricAlgorithm {
    /// Name used in the wire payload.
    pub fn name(&self) -> &'static str {
        match self {
            SymmetricAlgorithm::Aes128 => "aes128",
            SymmetricAlgorithm::Aes192 => "aes192",
            SymmetricAlgorithm::Aes256 => "aes256",
        }
    }

    /// OpenPGP symmetric algorithm identifier.
    pub fn id(&self) -> u8 {
        self.to_pgp().into()
    }

    pub fn key_len(&self) -> usize {
        match self {
            SymmetricAlgorithm::Aes128 => 16,
            SymmetricAlgorithm::Aes192 => 24,
            SymmetricAlgorithm::Aes256 => 32,
        }
    }

    pub(crate) fn to_pgp(self) -> SymmetricKeyAlgorithm {
        match self {
            SymmetricAlgorithm::Aes128 => SymmetricKeyAlgorithm::AES128,
            SymmetricAlgorithm::Aes192 => SymmetricKeyAlgorithm::AES192,
            SymmetricAlgorithm::Aes256 => SymmetricKeyAlgorithm::AES256,
        }
    }

    /// Only the AES family is accepted from incoming key packets.
    pub(crate) fn from_pgp(alg: SymmetricKeyAlgorithm) -> Result<Self, CryptoError> {
        match alg {
            SymmetricKeyAlgorithm::AES128 => Ok(SymmetricAlgorithm::Aes128),
            SymmetricKeyAlgorithm::AES192 => Ok(SymmetricAlgorithm::Aes192),
            SymmetricKeyAlgorithm::AES256 => Ok(SymmetricAlgorithm::Aes256),
            other => Err(CryptoError::MalformedPacket(format!(
                "unsupported symmetric algorithm {}",
                u8::from(other)
            ))),
        }
    }
}

/// Raw symmetric key plus its algorithm. Zeroized on drop.
#[derive(Clone)]
pub struct SessionKey {
    bytes: Zeroizing<Vec<u8>>,
    algorithm: SymmetricAlgorithm,
}

impl SessionKey {
    /// Fresh random AES-256 key from the OS random source.
    pub fn generate() -> Result<Self, CryptoError> {
        Self::generate_for(SymmetricAlgorithm::Aes256)
    }

    pub fn generate_for(algorithm: SymmetricAlgorithm) -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new(vec![0u8; algorithm.key_len()]);
        getrandom::getrandom(&mut bytes[..])
            .map_err(|e| CryptoError::SessionKeyGenerationFailed(e.to_string()))?;
        Ok(Self { bytes, algorithm })
    }

    pub fn from_bytes(bytes: &[u8], algorithm: SymmetricAlgorithm) -> Result<Self, CryptoError> {
        if bytes.len() != algorithm.key_len() {
            return Err(CryptoError::MalformedPacket(format!(
                "session key length {} for {}",
                bytes.len(),
                algorithm.name()
            )));
        }
        Ok(Self {
            bytes: Zeroizing::new(bytes.to_vec()),
            algorithm,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn algorithm(&self) -> SymmetricAlgorithm {
        self.algorithm
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes[..])
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        if self.algorithm != other.algorithm || self.bytes.len() != other.bytes.len() {
            return false;
        }
        // Constant time over the key bytes.
        let diff = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = SessionKey::generate().unwrap();
        let b = SessionKey::generate().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.algorithm().name(), "aes256");
        assert_eq!(a.as_bytes().len(), 32);
    }

    #[test]
    fn debug_is_redacted() {
        let key = SessionKey::from_bytes(&[0x41; 32], SymmetricAlgorithm::Aes256).unwrap();
        let shown = format!("{:?}", key);
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("65"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(SessionKey::from_bytes(&[0u8; 16], SymmetricAlgorithm::Aes256).is_err());
        assert!(SessionKey::from_bytes(&[0u8; 16], SymmetricAlgorithm::Aes128).is_ok());
    }

    #[test]
    fn openpgp_algorithm_mapping() {
        assert_eq!(SymmetricAlgorithm::Aes256.id(), 9);
        assert_eq!(SymmetricAlgorithm::Aes128.id(), 7);
        let alg = SymmetricAlgorithm::from_pgp(SymmetricKeyAlgorithm::AES192).unwrap();
        assert_eq!(alg, SymmetricAlgorithm::Aes192);
        assert!(SymmetricAlgorithm::from_pgp(SymmetricKeyAlgorithm::CAST5).is_err());
    }

    #[test]
    fn keys_of_different_algorithms_differ() {
        let a = SessionKey::from_bytes(&[1u8; 16], SymmetricAlgorithm::Aes128).unwrap();
        let b = SessionKey::from_bytes(&[1u8; 24], SymmetricAlgorithm::Aes192).unwrap();
        assert_ne!(a, b);
    }
}
