/*
 * rpgp.rs
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

//! OpenPGP backend on rpgp: v3 PKESK session key packets, SEIPD v1 data packets and v4
//! signatures, as exchanged by existing OpenPGP mail clients.

use pgp::composed::message::{decrypt_session_key, PlainSessionKey};
use pgp::crypto::hash::HashAlgorithm;
use pgp::packet::{Packet, PacketParser, PublicKeyEncryptedSessionKey, SymEncryptedProtectedData};
use pgp::ser::Serialize;
use pgp::types::{EskType, PkeskVersion, PublicKeyTrait};
use pgp::{Deserializable, Edata, Esk, Message, SignedSecretKey, StandaloneSignature};
use rand::rngs::OsRng;
use tracing::debug;

use super::backend::PgpBackend;
use super::error::CryptoError;
use super::keys::{PublicKey, UnlockedKeyRing, UnlockedPrivateKey};
use super::packet::LiteralData;
use super::session_key::{SessionKey, SymmetricAlgorithm};

const SIGNATURE_HASH: HashAlgorithm = HashAlgorithm::SHA2_256;

#[derive(Debug, Default, Clone, Copy)]
pub struct RpgpBackend;

impl RpgpBackend {
    pub fn new() -> Self {
        Self
    }
}

fn read_key_packets(bytes: &[u8]) -> Result<Vec<PublicKeyEncryptedSessionKey>, CryptoError> {
    let mut packets = Vec::new();
    for packet in PacketParser::new(bytes) {
        match packet.map_err(|e| CryptoError::MalformedPacket(e.to_string()))? {
            Packet::PublicKeyEncryptedSessionKey(p) => packets.push(p),
            Packet::Marker(_) | Packet::Padding(_) => {}
            other => {
                return Err(CryptoError::MalformedPacket(format!(
                    "unexpected {:?} packet among session key packets",
                    other.tag()
                )))
            }
        }
    }
    if packets.is_empty() {
        return Err(CryptoError::MalformedPacket("no session key packet".into()));
    }
    Ok(packets)
}

fn read_data_packet(bytes: &[u8]) -> Result<Edata, CryptoError> {
    let packet = PacketParser::new(bytes)
        .next()
        .ok_or_else(|| CryptoError::MalformedPacket("empty data packet".into()))?
        .map_err(|e| CryptoError::MalformedPacket(e.to_string()))?;
    Edata::try_from(packet).map_err(|e| CryptoError::MalformedPacket(e.to_string()))
}

/// Subkeys flagged for encryption first, then any encryption-capable subkey, then the primary.
fn wrap_session_key(key: &SessionKey, recipient: &PublicKey) -> Result<PublicKeyEncryptedSessionKey, CryptoError> {
    let cert = recipient.signed();
    let alg = key.algorithm().to_pgp();
    let flagged = cert.public_subkeys.iter().find(|k| {
        k.is_encryption_key() && k.signatures.iter().any(|s| s.key_flags().encrypt_comms())
    });
    let subkey = flagged.or_else(|| cert.public_subkeys.iter().find(|k| k.is_encryption_key()));
    let wrapped = if let Some(subkey) = subkey {
        PublicKeyEncryptedSessionKey::from_session_key_v3(OsRng, key.as_bytes(), alg, subkey)
    } else if cert.primary_key.is_encryption_key() {
        PublicKeyEncryptedSessionKey::from_session_key_v3(OsRng, key.as_bytes(), alg, &cert.primary_key)
    } else {
        return Err(CryptoError::RecipientKeyInvalid(format!(
            "{} has no encryption-capable key",
            recipient.key_id()
        )));
    };
    wrapped.map_err(|e| CryptoError::SessionKeyEncryptionFailed(e.to_string()))
}

fn to_session_key(plain: &PlainSessionKey) -> Result<SessionKey, CryptoError> {
    match plain {
        PlainSessionKey::V3_4 { sym_alg, key } => SessionKey::from_bytes(key, SymmetricAlgorithm::from_pgp(*sym_alg)?),
        _ => Err(CryptoError::MalformedPacket("unsupported session key version".into())),
    }
}

/// Try every encryption-capable key in `secret` that `pkesk` is addressed to.
fn unwrap_with(pkesk: &PublicKeyEncryptedSessionKey, secret: &SignedSecretKey) -> Option<SessionKey> {
    if pkesk.version() != PkeskVersion::V3 {
        return None;
    }
    let values = pkesk.values().ok()?;
    let primary = (pkesk.match_identity(&secret.primary_key) && secret.primary_key.is_encryption_key())
        .then(|| decrypt_session_key(&secret.primary_key, String::new, values, EskType::V3_4));
    let subkeys = secret
        .secret_subkeys
        .iter()
        .filter(|k| pkesk.match_identity(*k) && k.is_encryption_key())
        .map(|k| decrypt_session_key(k, String::new, values, EskType::V3_4));
    for attempt in primary.into_iter().chain(subkeys) {
        match attempt
            .map_err(|e| CryptoError::MalformedPacket(e.to_string()))
            .and_then(|plain| to_session_key(&plain))
        {
            Ok(key) => return Some(key),
            Err(e) => debug!(error = %e, "session key packet did not open"),
        }
    }
    None
}

fn literal_of(message: Message) -> Result<LiteralData, CryptoError> {
    match message {
        Message::Literal(data) => Ok(LiteralData {
            content: data.data().to_vec(),
            signature: None,
        }),
        Message::Signed {
            message: Some(inner),
            signature,
            ..
        } => {
            let content = inner
                .get_literal()
                .ok_or_else(|| CryptoError::DataDecryptionFailed("signed message without literal data".into()))?
                .data()
                .to_vec();
            let signature = StandaloneSignature::new(signature)
                .to_bytes()
                .map_err(|e| CryptoError::DataDecryptionFailed(e.to_string()))?;
            Ok(LiteralData {
                content,
                signature: Some(signature),
            })
        }
        _ => Err(CryptoError::DataDecryptionFailed("no literal data in message".into())),
    }
}

impl PgpBackend for RpgpBackend {
    fn generate_session_key(&self) -> Result<SessionKey, CryptoError> {
        SessionKey::generate()
    }

    fn encrypt_session_key(&self, key: &SessionKey, recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        let pkesk = wrap_session_key(key, recipient)?;
        Esk::PublicKeyEncryptedSessionKey(pkesk)
            .to_bytes()
            .map_err(|e| CryptoError::SessionKeyEncryptionFailed(e.to_string()))
    }

    fn decrypt_session_key(&self, key_packets: &[u8], keys: &UnlockedKeyRing) -> Result<SessionKey, CryptoError> {
        for pkesk in read_key_packets(key_packets)? {
            for key in keys.iter() {
                if let Some(session_key) = unwrap_with(&pkesk, key.signed()) {
                    return Ok(session_key);
                }
            }
        }
        Err(CryptoError::SessionKeyDecryptionFailed)
    }

    fn encrypt_data(
        &self,
        key: &SessionKey,
        name: &str,
        content: &[u8],
        signer: Option<&UnlockedPrivateKey>,
    ) -> Result<Vec<u8>, CryptoError> {
        let literal = Message::new_literal_bytes(name, content);
        let message = match signer {
            Some(signer) => literal
                .sign(OsRng, signer.signed(), String::new, SIGNATURE_HASH)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?,
            None => literal,
        };
        let plaintext = message
            .to_bytes()
            .map_err(|e| CryptoError::DataEncryptionFailed(e.to_string()))?;
        let seipd =
            SymEncryptedProtectedData::encrypt_seipdv1(OsRng, key.algorithm().to_pgp(), key.as_bytes(), &plaintext)
                .map_err(|e| CryptoError::DataEncryptionFailed(e.to_string()))?;
        Edata::SymEncryptedProtectedData(seipd)
            .to_bytes()
            .map_err(|e| CryptoError::DataEncryptionFailed(e.to_string()))
    }

    fn decrypt_data(&self, key: &SessionKey, data_packet: &[u8]) -> Result<LiteralData, CryptoError> {
        let edata = read_data_packet(data_packet)?;
        let plain = PlainSessionKey::V3_4 {
            sym_alg: key.algorithm().to_pgp(),
            key: key.as_bytes().to_vec(),
        };
        let message = edata
            .decrypt(plain)
            .and_then(Message::decompress)
            .map_err(|e| CryptoError::DataDecryptionFailed(e.to_string()))?;
        literal_of(message)
    }

    fn sign_detached(&self, data: &[u8], signer: &UnlockedPrivateKey) -> Result<Vec<u8>, CryptoError> {
        let signed = Message::new_literal_bytes("", data)
            .sign(OsRng, signer.signed(), String::new, SIGNATURE_HASH)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let Message::Signed { signature, .. } = signed else {
            return Err(CryptoError::SigningFailed("no signature produced".into()));
        };
        StandaloneSignature::new(signature)
            .to_bytes()
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }

    fn verify_detached(&self, data: &[u8], signature: &[u8], signer: &PublicKey) -> Result<(), CryptoError> {
        let signature = StandaloneSignature::from_bytes(signature).map_err(|_| CryptoError::SignatureInvalid)?;
        let cert = signer.signed();
        if signature.verify(&cert.primary_key, data).is_ok()
            || cert.public_subkeys.iter().any(|k| signature.verify(k, data).is_ok())
        {
            Ok(())
        } else {
            Err(CryptoError::SignatureInvalid)
        }
    }
}
