/*
 * draft.rs
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

//! The draft as handed over by the storage layer.

use std::collections::BTreeMap;

use crate::mime::MimeType;

/// Attachment metadata stored with the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttachment {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Framed key packet for the attachment's session key, addressed to the sender.
    pub key_packet: Option<Vec<u8>>,
    /// Encoded detached signature over the plaintext, when the attachment was signed on upload.
    pub signature: Option<Vec<u8>>,
}

impl DraftAttachment {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            key_packet: None,
            signature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Armored encrypted body, addressed to the sender.
    pub body: String,
    pub mime_type: MimeType,
    pub attachments: Vec<DraftAttachment>,
}

impl Draft {
    /// True when every attachment carries a stored signature (and with no attachments).
    pub fn all_attachments_signed(&self) -> bool {
        self.attachments.iter().all(|a| a.signature.is_some())
    }
}

/// Plaintext attachment bytes by attachment id, resolved before the pipeline runs.
/// A missing entry means the bytes are not available locally.
pub type AttachmentFiles = BTreeMap<String, Vec<u8>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_flag() {
        let mut draft = Draft {
            body: String::new(),
            mime_type: MimeType::PlainText,
            attachments: vec![],
        };
        assert!(draft.all_attachments_signed());
        let mut a = DraftAttachment::new("1", "a.txt", "text/plain");
        a.signature = Some(vec![1]);
        draft.attachments.push(a);
        assert!(draft.all_attachments_signed());
        draft.attachments.push(DraftAttachment::new("2", "b.txt", "text/plain"));
        assert!(!draft.all_attachments_signed());
    }
}
