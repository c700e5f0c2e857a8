/*
 * keys.rs
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

//! OpenPGP key material: recipient certificates, passphrase-protected secret keys, and the scoped
//! unlocked key ring.
//!
//! Secret keys are stored S2K-protected. `SenderKeyRing::use_keys` unlocks them for the duration of
//! one closure; the unlocked secret parameters are zeroized when the closure returns, on success
//! or error.

use std::fmt;

use pgp::crypto::ecc_curve::ECCCurve;
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::ser::Serialize;
use pgp::types::{PublicKeyTrait, S2kParams, StringToKey};
use pgp::{
    ArmorOptions, Deserializable, KeyType, SecretKeyParamsBuilder, SignedPublicKey, SignedSecretKey,
    SubkeyParamsBuilder,
};
use rand::rngs::OsRng;
use rand::Rng;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::error::CryptoError;

pub const KEY_ID_LEN: usize = 8;

/// Iterated-and-salted S2K count byte for newly protected keys (65011712 octets hashed).
pub const DEFAULT_S2K_COUNT: u8 = 224;

/// OpenPGP key ID: the low 64 bits of the v4 fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId([u8; KEY_ID_LEN]);

impl KeyId {
    pub fn from_bytes(bytes: [u8; KEY_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_ID_LEN] {
        &self.0
    }
}

impl From<&pgp::types::KeyId> for KeyId {
    fn from(id: &pgp::types::KeyId) -> Self {
        let mut bytes = [0u8; KEY_ID_LEN];
        let src = id.as_ref();
        let n = src.len().min(KEY_ID_LEN);
        bytes[..n].copy_from_slice(&src[..n]);
        Self(bytes)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self)
    }
}

/// A recipient or sender certificate (transferable public key with verified self-signatures).
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: SignedPublicKey,
}

impl PublicKey {
    pub fn from_signed(inner: SignedPublicKey) -> Result<Self, CryptoError> {
        inner
            .verify()
            .map_err(|e| CryptoError::RecipientKeyInvalid(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse a binary transferable public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let inner = SignedPublicKey::from_bytes(bytes).map_err(|e| CryptoError::RecipientKeyInvalid(e.to_string()))?;
        Self::from_signed(inner)
    }

    /// Parse a `PGP PUBLIC KEY BLOCK`.
    pub fn from_armored(text: &str) -> Result<Self, CryptoError> {
        let (inner, _headers) =
            SignedPublicKey::from_string(text).map_err(|e| CryptoError::RecipientKeyInvalid(e.to_string()))?;
        Self::from_signed(inner)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .to_bytes()
            .map_err(|e| CryptoError::MalformedPacket(e.to_string()))
    }

    pub fn to_armored(&self) -> Result<String, CryptoError> {
        self.inner
            .to_armored_string(ArmorOptions::default())
            .map_err(|e| CryptoError::MalformedArmor(e.to_string()))
    }

    /// Key ID of the primary key.
    pub fn key_id(&self) -> KeyId {
        KeyId::from(&self.inner.key_id())
    }

    /// True when the primary key or a subkey can receive encrypted session keys.
    pub fn can_encrypt(&self) -> bool {
        self.inner.primary_key.is_encryption_key()
            || self.inner.public_subkeys.iter().any(|k| k.is_encryption_key())
    }

    /// True when `id` names the primary key or one of its subkeys.
    pub fn has_key_id(&self, id: &KeyId) -> bool {
        &self.key_id() == id
            || self
                .inner
                .public_subkeys
                .iter()
                .any(|k| &KeyId::from(&k.key_id()) == id)
    }

    pub(crate) fn signed(&self) -> &SignedPublicKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey").field("id", &self.key_id()).finish()
    }
}

fn s2k_params(count: u8) -> S2kParams {
    let sym_alg = SymmetricKeyAlgorithm::AES256;
    let mut iv = vec![0u8; sym_alg.block_size()];
    OsRng.fill(&mut iv[..]);
    S2kParams::Cfb {
        sym_alg,
        s2k: StringToKey::new_iterated(OsRng, HashAlgorithm::SHA2_256, count),
        iv,
    }
}

/// A secret key whose parameters are in the clear, usable for decryption and signing.
/// Secret parameters are zeroized on drop.
pub struct UnlockedPrivateKey {
    secret: SignedSecretKey,
    public: PublicKey,
}

impl UnlockedPrivateKey {
    /// Generate an EdDSA signing key with a Curve25519 encryption subkey.
    pub fn generate(user_id: &str) -> Result<Self, CryptoError> {
        let subkey = SubkeyParamsBuilder::default()
            .key_type(KeyType::ECDH(ECCCurve::Curve25519))
            .can_encrypt(true)
            .build()
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let params = SecretKeyParamsBuilder::default()
            .key_type(KeyType::EdDSALegacy)
            .can_certify(true)
            .can_sign(true)
            .primary_user_id(user_id.to_owned())
            .subkey(subkey)
            .build()
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let secret = params
            .generate(OsRng)
            .and_then(|key| key.sign(OsRng, String::new))
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        Self::from_signed(secret)
    }

    /// Wrap a secret key that carries no passphrase protection.
    pub fn from_signed(secret: SignedSecretKey) -> Result<Self, CryptoError> {
        let protected = secret.primary_key.secret_params().is_encrypted()
            || secret
                .secret_subkeys
                .iter()
                .any(|k| k.key.secret_params().is_encrypted());
        if protected {
            return Err(CryptoError::KeyUnlockFailed);
        }
        let public = PublicKey::from_signed(SignedPublicKey::from(secret.clone()))?;
        Ok(Self { secret, public })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn key_id(&self) -> KeyId {
        self.public.key_id()
    }

    pub(crate) fn signed(&self) -> &SignedSecretKey {
        &self.secret
    }

    /// Protect this key under `passphrase` with the default S2K count.
    pub fn lock(&self, passphrase: &str) -> Result<LockedPrivateKey, CryptoError> {
        self.lock_with_s2k_count(passphrase, DEFAULT_S2K_COUNT)
    }

    pub fn lock_with_s2k_count(&self, passphrase: &str, count: u8) -> Result<LockedPrivateKey, CryptoError> {
        let mut secret = self.secret.clone();
        secret
            .primary_key
            .set_password_with_s2k(|| passphrase.to_owned(), s2k_params(count))
            .map_err(|e| CryptoError::KeyProtectionFailed(e.to_string()))?;
        for subkey in &mut secret.secret_subkeys {
            subkey
                .key
                .set_password_with_s2k(|| passphrase.to_owned(), s2k_params(count))
                .map_err(|e| CryptoError::KeyProtectionFailed(e.to_string()))?;
        }
        Ok(LockedPrivateKey {
            secret,
            public: self.public.clone(),
        })
    }
}

impl fmt::Debug for UnlockedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockedPrivateKey")
            .field("id", &self.public.key_id())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// A passphrase-protected transferable secret key.
#[derive(Clone)]
pub struct LockedPrivateKey {
    secret: SignedSecretKey,
    public: PublicKey,
}

impl LockedPrivateKey {
    pub fn from_signed(secret: SignedSecretKey) -> Result<Self, CryptoError> {
        let public = PublicKey::from_signed(SignedPublicKey::from(secret.clone()))?;
        Ok(Self { secret, public })
    }

    /// Parse a `PGP PRIVATE KEY BLOCK`.
    pub fn from_armored(text: &str) -> Result<Self, CryptoError> {
        let (secret, _headers) =
            SignedSecretKey::from_string(text).map_err(|e| CryptoError::PrivateKeyInvalid(e.to_string()))?;
        Self::from_signed(secret)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = SignedSecretKey::from_bytes(bytes).map_err(|e| CryptoError::PrivateKeyInvalid(e.to_string()))?;
        Self::from_signed(secret)
    }

    pub fn to_armored(&self) -> Result<String, CryptoError> {
        self.secret
            .to_armored_string(ArmorOptions::default())
            .map_err(|e| CryptoError::MalformedArmor(e.to_string()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Remove the S2K protection from the primary key and every secret subkey.
    pub fn unlock(&self, passphrase: &str) -> Result<UnlockedPrivateKey, CryptoError> {
        let mut secret = self.secret.clone();
        secret
            .primary_key
            .remove_password(|| passphrase.to_owned())
            .map_err(|_| CryptoError::KeyUnlockFailed)?;
        for subkey in &mut secret.secret_subkeys {
            subkey
                .key
                .remove_password(|| passphrase.to_owned())
                .map_err(|_| CryptoError::KeyUnlockFailed)?;
        }
        Ok(UnlockedPrivateKey {
            secret,
            public: self.public.clone(),
        })
    }
}

impl fmt::Debug for LockedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedPrivateKey")
            .field("id", &self.public.key_id())
            .finish_non_exhaustive()
    }
}

/// The sender's protected keys plus the passphrase that opens them. The first key is primary.
pub struct SenderKeyRing {
    keys: Vec<LockedPrivateKey>,
    passphrase: Zeroizing<String>,
}

impl SenderKeyRing {
    pub fn new(keys: Vec<LockedPrivateKey>, passphrase: &str) -> Self {
        Self {
            keys,
            passphrase: Zeroizing::new(passphrase.to_owned()),
        }
    }

    pub fn primary_public_key(&self) -> Option<&PublicKey> {
        self.keys.first().map(LockedPrivateKey::public_key)
    }

    /// Unlock every key that opens with the passphrase, run `f`, then drop (and zeroize) them.
    /// Keys that fail to unlock are skipped; if none unlock, `f` is not called.
    pub fn use_keys<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&UnlockedKeyRing) -> Result<T, E>,
        E: From<CryptoError>,
    {
        let mut unlocked = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            match key.unlock(&self.passphrase) {
                Ok(k) => unlocked.push(k),
                Err(e) => warn!(key = %key.public_key().key_id(), error = %e, "skipping key that failed to unlock"),
            }
        }
        if unlocked.is_empty() {
            return Err(CryptoError::KeyUnlockFailed.into());
        }
        let ring = UnlockedKeyRing { keys: unlocked };
        f(&ring)
    }
}

impl fmt::Debug for SenderKeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderKeyRing")
            .field("keys", &self.keys)
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Unlocked keys, only reachable inside [`SenderKeyRing::use_keys`].
pub struct UnlockedKeyRing {
    keys: Vec<UnlockedPrivateKey>,
}

impl UnlockedKeyRing {
    /// Ring over already unlocked keys; the first is primary.
    pub fn from_keys(keys: Vec<UnlockedPrivateKey>) -> Result<Self, CryptoError> {
        if keys.is_empty() {
            return Err(CryptoError::NoPrimaryKey);
        }
        Ok(Self { keys })
    }

    pub fn primary(&self) -> Result<&UnlockedPrivateKey, CryptoError> {
        self.keys.first().ok_or(CryptoError::NoPrimaryKey)
    }

    /// The key whose primary or subkey ID is `id`.
    pub fn find(&self, id: &KeyId) -> Option<&UnlockedPrivateKey> {
        self.keys.iter().find(|k| k.public_key().has_key_id(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnlockedPrivateKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Drop for UnlockedKeyRing {
    fn drop(&mut self) {
        debug!(keys = self.keys.len(), "releasing unlocked key ring");
    }
}

impl fmt::Debug for UnlockedKeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys.iter()).finish()
    }
}
