/*
 * pipeline.rs
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

//! One send attempt, end to end.
//!
//! The sender's keys are unlocked once for the whole attempt. Inside that scope the draft body
//! key and attachment keys are unwrapped, the MIME document is built once, PGP/MIME copies are
//! encrypted per recipient, and the assembler turns it all into packages. Nothing survives the
//! call: a retried send derives every key packet and signature again.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, SendConfig};
use crate::crypto::{
    EncryptedSplit, PgpBackend, PublicKey, RpgpBackend, SenderKeyRing, SessionKey, SessionKeyCodec,
    UnlockedKeyRing, UnlockedPrivateKey,
};
use crate::mime::{first_text_part, MimeAttachment, MimeBodyBuilder, MimeType};

use super::assembler::{Assembly, PackageAssembler, PackageInputs};
use super::attachment::{AttachmentEncryptor, AttachmentSource, EncryptedAttachment};
use super::classifier::{Bucket, Classification, RecipientClassifier};
use super::draft::{AttachmentFiles, Draft};
use super::error::{SendError, SendResult};
use super::package::{SendMessageBody, SendMessagePackage};
use super::preference::SendPreference;
use super::sink::PackageSink;

pub struct SendPipeline {
    backend: Arc<dyn PgpBackend>,
    config: SendConfig,
}

impl SendPipeline {
    /// Pipeline over the built-in OpenPGP backend.
    pub fn new(config: SendConfig) -> Self {
        Self::with_backend(Arc::new(RpgpBackend::new()), config)
    }

    pub fn with_backend(backend: Arc<dyn PgpBackend>, config: SendConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn PgpBackend {
        &*self.backend
    }

    /// Build the package list for `draft`. MIME boundaries come from the OS random source.
    pub fn generate_packages(
        &self,
        draft: &Draft,
        files: &AttachmentFiles,
        preferences: &BTreeMap<String, SendPreference>,
        sender: &SenderKeyRing,
    ) -> SendResult<Vec<SendMessagePackage>> {
        self.generate_packages_with_rng(draft, files, preferences, sender, OsRng)
    }

    /// As [`generate_packages`](Self::generate_packages) with an explicit random source for the
    /// MIME boundary.
    pub fn generate_packages_with_rng<R>(
        &self,
        draft: &Draft,
        files: &AttachmentFiles,
        preferences: &BTreeMap<String, SendPreference>,
        sender: &SenderKeyRing,
        rng: R,
    ) -> SendResult<Vec<SendMessagePackage>>
    where
        R: RngCore + CryptoRng + Send,
    {
        let classification = RecipientClassifier::classify(preferences);
        let eligible = classification.eligible_count();
        let expected = if self.config.require_all_recipients {
            preferences.len()
        } else {
            eligible
        };
        if eligible == 0 || eligible < expected {
            error!(
                recipients = preferences.len(),
                eligible,
                "not every recipient can receive the message"
            );
            return Err(SendError::PackageGenerationFailed {
                expected: preferences.len(),
                generated: eligible,
            });
        }

        let assembly = self.in_pool(|| {
            sender.use_keys(|keys| self.generate_unlocked(draft, files, preferences, &classification, keys, rng))
        })?;

        let generated = assembly.address_count();
        if generated != expected {
            error!(expected, generated, "package count mismatch, refusing to send");
            return Err(SendError::PackageGenerationFailed { expected, generated });
        }
        info!(
            packages = assembly.packages.len(),
            recipients = generated,
            dropped = classification.dropped().len(),
            "send packages generated"
        );
        Ok(assembly.packages)
    }

    /// Wrap packages in the transport payload.
    pub fn send_message_body(&self, packages: Vec<SendMessagePackage>) -> SendMessageBody {
        SendMessageBody {
            auto_save_contacts: self.config.auto_save_contacts,
            packages,
        }
    }

    /// Generate packages and hand them to `sink`. Returns the payload that was submitted.
    pub fn send(
        &self,
        draft: &Draft,
        files: &AttachmentFiles,
        preferences: &BTreeMap<String, SendPreference>,
        sender: &SenderKeyRing,
        sink: &mut dyn PackageSink,
    ) -> SendResult<SendMessageBody> {
        let packages = self.generate_packages(draft, files, preferences, sender)?;
        let body = self.send_message_body(packages);
        sink.submit_packages(&body)?;
        Ok(body)
    }

    /// Encrypt and sign every draft attachment whose bytes are available, addressed to the
    /// sender's primary key.
    pub fn encrypt_attachments(
        &self,
        draft: &Draft,
        files: &AttachmentFiles,
        sender: &SenderKeyRing,
    ) -> SendResult<BTreeMap<String, EncryptedAttachment>> {
        let sources: Vec<AttachmentSource<'_>> = draft
            .attachments
            .iter()
            .filter_map(|a| match files.get(&a.id) {
                Some(content) => Some(AttachmentSource {
                    id: &a.id,
                    name: &a.name,
                    content,
                }),
                None => {
                    warn!(attachment = %a.id, "attachment bytes unavailable, not encrypted");
                    None
                }
            })
            .collect();
        self.in_pool(|| {
            sender.use_keys(|keys| {
                let primary = keys.primary()?;
                AttachmentEncryptor::new(self.backend()).encrypt_all(primary, &sources)
            })
        })
    }

    /// Encrypt the attachments and upload each through `sink`, stopping at the first failure.
    pub fn upload_attachments(
        &self,
        draft: &Draft,
        files: &AttachmentFiles,
        sender: &SenderKeyRing,
        sink: &mut dyn PackageSink,
    ) -> SendResult<BTreeMap<String, EncryptedAttachment>> {
        let encrypted = self.encrypt_attachments(draft, files, sender)?;
        for (id, attachment) in &encrypted {
            sink.upload_attachment(id, attachment)?;
            debug!(attachment = %id, "attachment uploaded");
        }
        Ok(encrypted)
    }

    fn in_pool<T, F>(&self, f: F) -> SendResult<T>
    where
        T: Send,
        F: FnOnce() -> SendResult<T> + Send,
    {
        if self.config.max_parallelism == 0 {
            return f();
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallelism)
            .build()
            .map_err(|e| {
                warn!(error = %e, "cannot build worker pool");
                ConfigError::InvalidValue {
                    element: "max-parallelism".to_string(),
                    value: self.config.max_parallelism.to_string(),
                }
            })?;
        pool.install(f)
    }

    fn generate_unlocked<R: RngCore + CryptoRng>(
        &self,
        draft: &Draft,
        files: &AttachmentFiles,
        preferences: &BTreeMap<String, SendPreference>,
        classification: &Classification,
        keys: &UnlockedKeyRing,
        rng: R,
    ) -> SendResult<Assembly> {
        let codec = SessionKeyCodec::new(self.backend());
        let (body_key, body_data_packet) = codec
            .split_and_decrypt_body_key(&draft.body, keys)
            .map_err(SendError::SessionKeyDecryptionFailed)?;
        let attachment_keys = decrypt_attachment_keys(&codec, draft, keys)?;

        let needs_mime = classification.has(Bucket::ClearMime) || classification.has(Bucket::PgpMime);
        let mut clear_mime: Option<(SessionKey, Vec<u8>)> = None;
        let mut pgp_mime_bodies = BTreeMap::new();
        if needs_mime {
            let primary = keys.primary()?;
            let document = self.build_mime(&codec, &body_key, &body_data_packet, draft, files, rng)?;

            if classification.has(Bucket::ClearMime) {
                let split = self
                    .backend
                    .encrypt_and_sign(&document, primary.public_key(), primary)
                    .map_err(SendError::MimeBodyEncryptionFailed)?;
                let mime_key = codec
                    .decrypt_session_key(&split.key_packet, keys)
                    .map_err(SendError::SessionKeyDecryptionFailed)?;
                clear_mime = Some((mime_key, split.data_packet));
            }

            let targets: Vec<(&str, &PublicKey)> = classification
                .recipients(Bucket::PgpMime)
                .filter_map(|r| preferences.get(r).and_then(|p| p.public_key.as_ref()).map(|k| (r, k)))
                .collect();
            pgp_mime_bodies = self.encrypt_pgp_mime(&document, &targets, primary);
        }

        let inputs = PackageInputs {
            body_key: &body_key,
            body_data_packet: &body_data_packet,
            body_mime_type: draft.mime_type,
            attachment_keys: &attachment_keys,
            clear_mime: clear_mime.as_ref().map(|(k, p)| (k, p.as_slice())),
            pgp_mime_bodies: &pgp_mime_bodies,
            preferences,
            classification,
            all_attachments_signed: draft.all_attachments_signed(),
        };
        let assembly = PackageAssembler::new(codec).assemble(&inputs);
        for (recipient, e) in &assembly.dropped {
            debug!(recipient = %recipient, error = %e, "recipient missing from packages");
        }
        Ok(assembly)
    }

    /// Decrypt the draft body and serialize it with the attachments as multipart/mixed.
    fn build_mime<R: RngCore + CryptoRng>(
        &self,
        codec: &SessionKeyCodec<'_>,
        body_key: &SessionKey,
        body_data_packet: &[u8],
        draft: &Draft,
        files: &AttachmentFiles,
        rng: R,
    ) -> SendResult<Vec<u8>> {
        let plaintext = codec
            .decrypt_data(body_key, body_data_packet)
            .map_err(|e| SendError::BodyDecryptionFailed(e.to_string()))?;
        let (body, body_type) = match draft.mime_type {
            MimeType::MultipartMixed => {
                let part = first_text_part(&plaintext)
                    .ok_or_else(|| SendError::BodyDecryptionFailed("no text part in MIME draft".to_string()))?;
                (part.content, part.mime_type)
            }
            text => (plaintext, text),
        };

        let attachments: Vec<MimeAttachment<'_>> = draft
            .attachments
            .iter()
            .map(|a| MimeAttachment {
                name: &a.name,
                mime_type: &a.mime_type,
                content: files.get(&a.id).map(Vec::as_slice),
            })
            .collect();
        let document = MimeBodyBuilder::new(rng)
            .with_collision_check(self.config.check_boundary_collision, self.config.boundary_attempts)
            .build(&body, body_type, &attachments)?;
        debug!(parts = document.part_count(), bytes = document.as_bytes().len(), "MIME body built");
        Ok(document.into_bytes())
    }

    /// Encrypt and sign the MIME document for each PGP/MIME recipient. A recipient whose copy
    /// fails is left out; the assembler drops it.
    fn encrypt_pgp_mime(
        &self,
        document: &[u8],
        targets: &[(&str, &PublicKey)],
        signer: &UnlockedPrivateKey,
    ) -> BTreeMap<String, EncryptedSplit> {
        let results: Vec<_> = targets
            .par_iter()
            .map(|(r, key)| (*r, self.backend.encrypt_and_sign(document, key, signer)))
            .collect();
        let mut out = BTreeMap::new();
        for (recipient, result) in results {
            match result {
                Ok(split) => {
                    out.insert(recipient.to_string(), split);
                }
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "PGP/MIME encryption failed, recipient left out");
                }
            }
        }
        out
    }
}

fn decrypt_attachment_keys(
    codec: &SessionKeyCodec<'_>,
    draft: &Draft,
    keys: &UnlockedKeyRing,
) -> SendResult<BTreeMap<String, SessionKey>> {
    let mut out = BTreeMap::new();
    for attachment in &draft.attachments {
        let packet = attachment
            .key_packet
            .as_deref()
            .ok_or_else(|| SendError::AttachmentKeyPacketMissing(attachment.id.clone()))?;
        let key = codec
            .decrypt_session_key(packet, keys)
            .map_err(SendError::SessionKeyDecryptionFailed)?;
        out.insert(attachment.id.clone(), key);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::LockedPrivateKey;
    use crate::send::preference::PackageType;

    fn sender() -> (SenderKeyRing, UnlockedPrivateKey) {
        let key = UnlockedPrivateKey::generate("test@example.com").unwrap();
        let locked: LockedPrivateKey = key.lock_with_s2k_count("pw", 96).unwrap();
        (SenderKeyRing::new(vec![locked], "pw"), key)
    }

    fn draft(owner: &UnlockedPrivateKey) -> Draft {
        let body = RpgpBackend::new()
            .encrypt_message(b"hello", owner.public_key(), None)
            .unwrap()
            .to_armored()
            .unwrap();
        Draft {
            body,
            mime_type: MimeType::PlainText,
            attachments: vec![],
        }
    }

    #[test]
    fn no_eligible_recipient_fails() {
        let (ring, key) = sender();
        let mut prefs = BTreeMap::new();
        prefs.insert("x@y".to_string(), SendPreference::new(PackageType::PgpMime, true, true));
        let err = SendPipeline::new(SendConfig::default())
            .generate_packages(&draft(&key), &AttachmentFiles::new(), &prefs, &ring)
            .unwrap_err();
        assert!(matches!(err, SendError::PackageGenerationFailed { expected: 1, generated: 0 }));
    }

    #[test]
    fn wrong_passphrase_fails_before_any_work() {
        let key = UnlockedPrivateKey::generate("test@example.com").unwrap();
        let ring = SenderKeyRing::new(vec![key.lock_with_s2k_count("pw", 96).unwrap()], "other");
        let mut prefs = BTreeMap::new();
        prefs.insert("c@x".to_string(), SendPreference::new(PackageType::Cleartext, false, false));
        let err = SendPipeline::new(SendConfig::default())
            .generate_packages(&draft(&key), &AttachmentFiles::new(), &prefs, &ring)
            .unwrap_err();
        assert!(matches!(err, SendError::Crypto(crate::crypto::CryptoError::KeyUnlockFailed)));
    }

    #[test]
    fn attachment_without_key_packet_aborts() {
        let (ring, key) = sender();
        let mut d = draft(&key);
        d.attachments.push(crate::send::draft::DraftAttachment::new("a1", "a.txt", "text/plain"));
        let mut prefs = BTreeMap::new();
        prefs.insert("c@x".to_string(), SendPreference::new(PackageType::Cleartext, false, false));
        let err = SendPipeline::new(SendConfig::default())
            .generate_packages(&d, &AttachmentFiles::new(), &prefs, &ring)
            .unwrap_err();
        assert!(matches!(err, SendError::AttachmentKeyPacketMissing(ref id) if id == "a1"));
    }

    #[test]
    fn dropped_recipient_fails_unless_partial_sends_allowed() {
        let (ring, key) = sender();
        let mut prefs = BTreeMap::new();
        prefs.insert("c@x".to_string(), SendPreference::new(PackageType::Cleartext, false, false));
        prefs.insert("nokey@x".to_string(), SendPreference::new(PackageType::PgpMime, true, true));
        let err = SendPipeline::new(SendConfig::default())
            .generate_packages(&draft(&key), &AttachmentFiles::new(), &prefs, &ring)
            .unwrap_err();
        assert!(matches!(err, SendError::PackageGenerationFailed { expected: 2, generated: 1 }));

        let partial = SendConfig {
            require_all_recipients: false,
            ..SendConfig::default()
        };
        let packages = SendPipeline::new(partial)
            .generate_packages(&draft(&key), &AttachmentFiles::new(), &prefs, &ring)
            .unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].addresses.keys().collect::<Vec<_>>(), vec!["c@x"]);
    }

    #[test]
    fn bounded_pool_produces_same_shape() {
        let (ring, key) = sender();
        let config = SendConfig {
            max_parallelism: 2,
            ..SendConfig::default()
        };
        let mut prefs = BTreeMap::new();
        prefs.insert("c@x".to_string(), SendPreference::new(PackageType::Cleartext, false, false));
        let packages = SendPipeline::new(config)
            .generate_packages(&draft(&key), &AttachmentFiles::new(), &prefs, &ring)
            .unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].package_type, 4);
    }
}
