/*
 * package.rs
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

//! Send packages and their JSON wire form.
//!
//! ```text
//! { "autoSaveContacts": 0|1,
//!   "packages": [ { "addresses": { "<email>": { "signature": 0|1, ... } },
//!                   "mimeType": "...", "body": "<base64>", "type": <bitmask>,
//!                   "bodyKey": { "key": "<base64>", "algorithm": "aes256" },
//!                   "attachmentKeys": { "<id>": { "key": ..., "algorithm": ... } } } ] }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::SessionKey;
use crate::json::JsonWriter;
use crate::mime::MimeType;

use super::preference::PackageType;

/// One recipient's entry in a package.
#[derive(Clone, PartialEq, Eq)]
pub enum AddressPackage {
    /// Same-provider recipient: body and attachment session keys wrapped to their key.
    Internal {
        signature: bool,
        body_key_packet: Vec<u8>,
        attachment_key_packets: BTreeMap<String, Vec<u8>>,
    },
    /// PGP/MIME recipient: the package body is encrypted to them alone.
    ExternalEncrypted { signature: bool, body_key_packet: Vec<u8> },
    /// Signed but unencrypted MIME.
    ExternalSigned { signature: bool },
    /// Plain, unencrypted.
    ExternalCleartext { signature: bool },
}

impl AddressPackage {
    pub fn package_type(&self) -> PackageType {
        match self {
            AddressPackage::Internal { .. } => PackageType::ProtonMail,
            AddressPackage::ExternalEncrypted { .. } => PackageType::PgpMime,
            AddressPackage::ExternalSigned { .. } => PackageType::ClearMime,
            AddressPackage::ExternalCleartext { .. } => PackageType::Cleartext,
        }
    }

    pub fn type_code(&self) -> u32 {
        self.package_type().code()
    }

    pub fn signature(&self) -> bool {
        match self {
            AddressPackage::Internal { signature, .. }
            | AddressPackage::ExternalEncrypted { signature, .. }
            | AddressPackage::ExternalSigned { signature }
            | AddressPackage::ExternalCleartext { signature } => *signature,
        }
    }

    /// True for recipients that receive the body without per-recipient encryption.
    pub fn needs_raw_keys(&self) -> bool {
        matches!(
            self,
            AddressPackage::ExternalSigned { .. } | AddressPackage::ExternalCleartext { .. }
        )
    }

    fn write_json(&self, w: &mut JsonWriter) {
        w.write_start_object();
        w.write_u64_field("signature", u64::from(self.signature()));
        match self {
            AddressPackage::Internal {
                body_key_packet,
                attachment_key_packets,
                ..
            } => {
                w.write_string_field("bodyKeyPacket", &STANDARD.encode(body_key_packet));
                w.write_key("attachmentKeyPackets");
                w.write_start_object();
                for (id, packet) in attachment_key_packets {
                    w.write_string_field(id, &STANDARD.encode(packet));
                }
                w.write_end_object();
            }
            AddressPackage::ExternalEncrypted { body_key_packet, .. } => {
                w.write_string_field("bodyKeyPacket", &STANDARD.encode(body_key_packet));
            }
            AddressPackage::ExternalSigned { .. } | AddressPackage::ExternalCleartext { .. } => {}
        }
        w.write_end_object();
    }
}

impl fmt::Debug for AddressPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(match self {
            AddressPackage::Internal { .. } => "Internal",
            AddressPackage::ExternalEncrypted { .. } => "ExternalEncrypted",
            AddressPackage::ExternalSigned { .. } => "ExternalSigned",
            AddressPackage::ExternalCleartext { .. } => "ExternalCleartext",
        });
        s.field("signature", &self.signature());
        if let AddressPackage::Internal { attachment_key_packets, .. } = self {
            s.field("attachments", &attachment_key_packets.len());
        }
        s.finish()
    }
}

/// A package shared by one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessagePackage {
    pub addresses: BTreeMap<String, AddressPackage>,
    pub mime_type: MimeType,
    /// Framed data packet.
    pub body: Vec<u8>,
    /// OR of every address type code.
    pub package_type: u32,
    pub body_key: Option<SessionKey>,
    pub attachment_keys: Option<BTreeMap<String, SessionKey>>,
}

impl SendMessagePackage {
    /// Package over `addresses` with the type bitmask derived from them.
    pub fn new(addresses: BTreeMap<String, AddressPackage>, mime_type: MimeType, body: Vec<u8>) -> Self {
        let package_type = addresses.values().fold(0, |acc, a| acc | a.type_code());
        Self {
            addresses,
            mime_type,
            body,
            package_type,
            body_key: None,
            attachment_keys: None,
        }
    }

    pub fn with_body_key(mut self, key: SessionKey) -> Self {
        self.body_key = Some(key);
        self
    }

    pub fn with_attachment_keys(mut self, keys: BTreeMap<String, SessionKey>) -> Self {
        self.attachment_keys = Some(keys);
        self
    }

    pub fn write_json(&self, w: &mut JsonWriter) {
        w.write_start_object();
        w.write_key("addresses");
        w.write_start_object();
        for (email, address) in &self.addresses {
            w.write_key(email);
            address.write_json(w);
        }
        w.write_end_object();
        w.write_string_field("mimeType", self.mime_type.as_str());
        w.write_string_field("body", &STANDARD.encode(&self.body));
        w.write_u64_field("type", u64::from(self.package_type));
        if let Some(key) = &self.body_key {
            w.write_key("bodyKey");
            write_key_json(w, key);
        }
        if let Some(keys) = &self.attachment_keys {
            w.write_key("attachmentKeys");
            w.write_start_object();
            for (id, key) in keys {
                w.write_key(id);
                write_key_json(w, key);
            }
            w.write_end_object();
        }
        w.write_end_object();
    }
}

fn write_key_json(w: &mut JsonWriter, key: &SessionKey) {
    w.write_start_object();
    w.write_string_field("key", &key.to_base64());
    w.write_string_field("algorithm", key.algorithm().name());
    w.write_end_object();
}

/// Request body handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageBody {
    pub auto_save_contacts: bool,
    pub packages: Vec<SendMessagePackage>,
}

impl SendMessageBody {
    pub fn to_json(&self) -> Vec<u8> {
        let mut w = JsonWriter::new();
        w.write_start_object();
        w.write_u64_field("autoSaveContacts", u64::from(self.auto_save_contacts));
        w.write_key("packages");
        w.write_start_array();
        for package in &self.packages {
            package.write_json(&mut w);
        }
        w.write_end_array();
        w.write_end_object();
        w.take_buffer().to_vec()
    }

    /// Number of recipients across all packages.
    pub fn recipient_count(&self) -> usize {
        self.packages.iter().map(|p| p.addresses.len()).sum()
    }
}
