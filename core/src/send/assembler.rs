/*
 * assembler.rs
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

//! Turn classified recipients and prepared bodies into the ordered package list:
//! the shared ProtonMail/Cleartext package, then the ClearMime package, then one package per
//! PGP/MIME recipient.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::warn;

use crate::crypto::{EncryptedSplit, SessionKey, SessionKeyCodec};
use crate::mime::MimeType;

use super::classifier::{Bucket, Classification};
use super::error::{SendError, SendResult};
use super::package::{AddressPackage, SendMessagePackage};
use super::preference::SendPreference;

/// Everything the assembler reads. All of it is shared read-only across recipients.
pub struct PackageInputs<'a> {
    pub body_key: &'a SessionKey,
    /// Framed data packet of the draft body.
    pub body_data_packet: &'a [u8],
    pub body_mime_type: MimeType,
    pub attachment_keys: &'a BTreeMap<String, SessionKey>,
    /// Session key and data packet of the signed MIME document, when ClearMime recipients exist.
    pub clear_mime: Option<(&'a SessionKey, &'a [u8])>,
    /// Encrypted and signed MIME document per PGP/MIME recipient.
    pub pgp_mime_bodies: &'a BTreeMap<String, EncryptedSplit>,
    pub preferences: &'a BTreeMap<String, SendPreference>,
    pub classification: &'a Classification,
    pub all_attachments_signed: bool,
}

/// Packages plus the recipients that were dropped while building them.
#[derive(Debug)]
pub struct Assembly {
    pub packages: Vec<SendMessagePackage>,
    pub dropped: Vec<(String, SendError)>,
}

impl Assembly {
    pub fn address_count(&self) -> usize {
        self.packages.iter().map(|p| p.addresses.len()).sum()
    }
}

pub struct PackageAssembler<'a> {
    codec: SessionKeyCodec<'a>,
}

impl<'a> PackageAssembler<'a> {
    pub fn new(codec: SessionKeyCodec<'a>) -> Self {
        Self { codec }
    }

    pub fn assemble(&self, inputs: &PackageInputs<'_>) -> Assembly {
        let mut assembly = Assembly {
            packages: Vec::new(),
            dropped: Vec::new(),
        };
        if let Some(p) = self.proton_and_cleartext(inputs, &mut assembly.dropped) {
            assembly.packages.push(p);
        }
        if let Some(p) = self.clear_mime(inputs, &mut assembly.dropped) {
            assembly.packages.push(p);
        }
        let pgp = self.pgp_mime(inputs, &mut assembly.dropped);
        assembly.packages.extend(pgp);
        assembly
    }

    fn internal_address(&self, recipient: &str, inputs: &PackageInputs<'_>) -> SendResult<AddressPackage> {
        let key = inputs
            .preferences
            .get(recipient)
            .and_then(|p| p.public_key.as_ref())
            .ok_or_else(|| SendError::RecipientPublicKeyMissing(recipient.to_string()))?;
        let body_key_packet = self.codec.re_encrypt_session_key(inputs.body_key, key)?;
        let attachment_key_packets = inputs
            .attachment_keys
            .iter()
            .map(|(id, k)| Ok((id.clone(), self.codec.re_encrypt_session_key(k, key)?)))
            .collect::<SendResult<BTreeMap<_, _>>>()?;
        Ok(AddressPackage::Internal {
            signature: inputs.all_attachments_signed,
            body_key_packet,
            attachment_key_packets,
        })
    }

    fn proton_and_cleartext(
        &self,
        inputs: &PackageInputs<'_>,
        dropped: &mut Vec<(String, SendError)>,
    ) -> Option<SendMessagePackage> {
        let internal: Vec<&str> = inputs.classification.recipients(Bucket::ProtonMail).collect();
        let results: Vec<_> = internal
            .par_iter()
            .map(|r| (*r, self.internal_address(r, inputs)))
            .collect();

        let mut addresses = BTreeMap::new();
        for (recipient, result) in results {
            match result {
                Ok(address) => {
                    addresses.insert(recipient.to_string(), address);
                }
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "dropping internal recipient");
                    dropped.push((recipient.to_string(), e));
                }
            }
        }
        let mut has_cleartext = false;
        for recipient in inputs.classification.recipients(Bucket::Cleartext) {
            has_cleartext = true;
            addresses.insert(
                recipient.to_string(),
                AddressPackage::ExternalCleartext {
                    signature: inputs.all_attachments_signed,
                },
            );
        }
        if addresses.is_empty() {
            return None;
        }

        let mut package = SendMessagePackage::new(addresses, inputs.body_mime_type, inputs.body_data_packet.to_vec());
        if has_cleartext {
            package = package
                .with_body_key(inputs.body_key.clone())
                .with_attachment_keys(inputs.attachment_keys.clone());
        }
        Some(package)
    }

    fn clear_mime(
        &self,
        inputs: &PackageInputs<'_>,
        dropped: &mut Vec<(String, SendError)>,
    ) -> Option<SendMessagePackage> {
        let recipients: Vec<&str> = inputs.classification.recipients(Bucket::ClearMime).collect();
        if recipients.is_empty() {
            return None;
        }
        let Some((key, data_packet)) = inputs.clear_mime else {
            for r in recipients {
                warn!(recipient = %r, "no signed MIME body, dropping recipient");
                dropped.push((r.to_string(), SendError::RecipientEncryptedBodyMissing(r.to_string())));
            }
            return None;
        };
        let addresses = recipients
            .into_iter()
            .map(|r| {
                (
                    r.to_string(),
                    AddressPackage::ExternalSigned {
                        signature: inputs.all_attachments_signed,
                    },
                )
            })
            .collect();
        Some(SendMessagePackage::new(addresses, MimeType::MultipartMixed, data_packet.to_vec()).with_body_key(key.clone()))
    }

    fn pgp_mime(&self, inputs: &PackageInputs<'_>, dropped: &mut Vec<(String, SendError)>) -> Vec<SendMessagePackage> {
        let mut packages = Vec::new();
        for recipient in inputs.classification.recipients(Bucket::PgpMime) {
            let Some(split) = inputs.pgp_mime_bodies.get(recipient) else {
                let e = SendError::RecipientEncryptedBodyMissing(recipient.to_string());
                warn!(recipient = %recipient, error = %e, "dropping PGP/MIME recipient");
                dropped.push((recipient.to_string(), e));
                continue;
            };
            let mut addresses = BTreeMap::new();
            addresses.insert(
                recipient.to_string(),
                AddressPackage::ExternalEncrypted {
                    signature: inputs.all_attachments_signed,
                    body_key_packet: split.key_packet.clone(),
                },
            );
            packages.push(SendMessagePackage::new(
                addresses,
                MimeType::MultipartMixed,
                split.data_packet.clone(),
            ));
        }
        packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PublicKey, RpgpBackend, UnlockedKeyRing, UnlockedPrivateKey};
    use crate::send::classifier::RecipientClassifier;
    use crate::send::preference::PackageType;

    struct Fixture {
        backend: RpgpBackend,
        body_key: SessionKey,
        attachment_keys: BTreeMap<String, SessionKey>,
        mime_key: SessionKey,
    }

    fn fixture() -> Fixture {
        let mut attachment_keys = BTreeMap::new();
        attachment_keys.insert("att".to_string(), SessionKey::generate().unwrap());
        Fixture {
            backend: RpgpBackend::new(),
            body_key: SessionKey::generate().unwrap(),
            attachment_keys,
            mime_key: SessionKey::generate().unwrap(),
        }
    }

    fn run(
        f: &Fixture,
        prefs: &BTreeMap<String, SendPreference>,
        pgp: &BTreeMap<String, EncryptedSplit>,
    ) -> Assembly {
        let classification = RecipientClassifier::classify(prefs);
        let inputs = PackageInputs {
            body_key: &f.body_key,
            body_data_packet: b"body-packet",
            body_mime_type: MimeType::Html,
            attachment_keys: &f.attachment_keys,
            clear_mime: Some((&f.mime_key, b"mime-packet")),
            pgp_mime_bodies: pgp,
            preferences: prefs,
            classification: &classification,
            all_attachments_signed: true,
        };
        PackageAssembler::new(SessionKeyCodec::new(&f.backend)).assemble(&inputs)
    }

    fn key() -> (PublicKey, UnlockedPrivateKey) {
        let k = UnlockedPrivateKey::generate("test@example.com").unwrap();
        (k.public_key().clone(), k)
    }

    #[test]
    fn internal_only_has_no_raw_keys() {
        let f = fixture();
        let (pk, sk) = key();
        let mut prefs = BTreeMap::new();
        prefs.insert("in@p.me".to_string(), SendPreference::new(PackageType::ProtonMail, true, true).with_public_key(pk));
        let a = run(&f, &prefs, &BTreeMap::new());
        assert_eq!(a.packages.len(), 1);
        let p = &a.packages[0];
        assert_eq!(p.package_type, 1);
        assert_eq!(p.mime_type, MimeType::Html);
        assert!(p.body_key.is_none() && p.attachment_keys.is_none());

        let AddressPackage::Internal { body_key_packet, attachment_key_packets, signature } = &p.addresses["in@p.me"] else {
            panic!("expected internal address");
        };
        assert!(*signature);
        let ring = UnlockedKeyRing::from_keys(vec![sk]).unwrap();
        let codec = SessionKeyCodec::new(&f.backend);
        assert_eq!(codec.decrypt_session_key(body_key_packet, &ring).unwrap(), f.body_key);
        assert_eq!(
            codec.decrypt_session_key(&attachment_key_packets["att"], &ring).unwrap(),
            f.attachment_keys["att"]
        );
    }

    #[test]
    fn ordering_and_raw_key_exposure() {
        let f = fixture();
        let (pk1, _) = key();
        let (pk2, _) = key();
        let mut prefs = BTreeMap::new();
        prefs.insert("a@pgp".to_string(), SendPreference::new(PackageType::PgpMime, true, true).with_public_key(pk2));
        prefs.insert("b@clear".to_string(), SendPreference::new(PackageType::Cleartext, false, false));
        prefs.insert("c@signed".to_string(), SendPreference::new(PackageType::ClearMime, false, true));
        prefs.insert("d@proton".to_string(), SendPreference::new(PackageType::ProtonMail, true, true).with_public_key(pk1));
        let mut pgp = BTreeMap::new();
        pgp.insert(
            "a@pgp".to_string(),
            EncryptedSplit {
                key_packet: b"kp".to_vec(),
                data_packet: b"dp".to_vec(),
            },
        );
        let a = run(&f, &prefs, &pgp);
        assert!(a.dropped.is_empty());
        assert_eq!(a.packages.len(), 3);

        let merged = &a.packages[0];
        assert_eq!(merged.package_type, 1 | 4);
        assert_eq!(merged.body_key.as_ref(), Some(&f.body_key));
        assert_eq!(merged.attachment_keys.as_ref(), Some(&f.attachment_keys));

        let signed = &a.packages[1];
        assert_eq!(signed.package_type, 32);
        assert_eq!(signed.body, b"mime-packet");
        assert_eq!(signed.body_key.as_ref(), Some(&f.mime_key));
        assert_eq!(signed.mime_type, MimeType::MultipartMixed);

        let pgp_package = &a.packages[2];
        assert_eq!(pgp_package.package_type, 16);
        assert_eq!(pgp_package.body, b"dp");
        assert!(pgp_package.body_key.is_none());
        assert_eq!(
            pgp_package.addresses["a@pgp"],
            AddressPackage::ExternalEncrypted {
                signature: true,
                body_key_packet: b"kp".to_vec()
            }
        );
    }

    #[test]
    fn missing_pgp_body_drops_only_that_recipient() {
        let f = fixture();
        let (pk, _) = key();
        let mut prefs = BTreeMap::new();
        prefs.insert("x@pgp".to_string(), SendPreference::new(PackageType::PgpMime, true, true).with_public_key(pk));
        prefs.insert("y@clear".to_string(), SendPreference::new(PackageType::Cleartext, false, false));
        let a = run(&f, &prefs, &BTreeMap::new());
        assert_eq!(a.packages.len(), 1);
        assert_eq!(a.address_count(), 1);
        assert_eq!(a.dropped.len(), 1);
        assert!(matches!(a.dropped[0].1, SendError::RecipientEncryptedBodyMissing(_)));
    }
}
