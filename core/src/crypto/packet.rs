/*
 * packet.rs
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

//! An encrypted OpenPGP message split into its two halves: the public-key encrypted session key
//! packets and the symmetrically encrypted integrity protected data packet.

use pgp::ser::Serialize;
use pgp::{ArmorOptions, Deserializable, Message};

use super::error::CryptoError;

/// The two halves of an encrypted message, each a binary OpenPGP packet sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSplit {
    pub key_packet: Vec<u8>,
    pub data_packet: Vec<u8>,
}

impl EncryptedSplit {
    pub fn from_message(message: &Message) -> Result<Self, CryptoError> {
        let Message::Encrypted { esk, edata } = message else {
            return Err(CryptoError::MalformedPacket("not an encrypted message".into()));
        };
        if esk.is_empty() {
            return Err(CryptoError::MalformedPacket("no session key packet".into()));
        }
        let mut key_packet = Vec::new();
        for packet in esk {
            packet
                .to_writer(&mut key_packet)
                .map_err(|e| CryptoError::MalformedPacket(e.to_string()))?;
        }
        let data_packet = edata
            .to_bytes()
            .map_err(|e| CryptoError::MalformedPacket(e.to_string()))?;
        Ok(Self {
            key_packet,
            data_packet,
        })
    }

    /// Split a binary message.
    pub fn split(message: &[u8]) -> Result<Self, CryptoError> {
        let message = Message::from_bytes(message).map_err(|e| CryptoError::MalformedPacket(e.to_string()))?;
        Self::from_message(&message)
    }

    /// Split a `PGP MESSAGE` armor block.
    pub fn split_armored(text: &str) -> Result<Self, CryptoError> {
        let (message, _headers) = Message::from_string(text).map_err(|e| CryptoError::MalformedArmor(e.to_string()))?;
        Self::from_message(&message)
    }

    pub fn join(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.key_packet.len() + self.data_packet.len());
        out.extend_from_slice(&self.key_packet);
        out.extend_from_slice(&self.data_packet);
        out
    }

    pub fn to_armored(&self) -> Result<String, CryptoError> {
        let message = Message::from_bytes(&self.join()[..]).map_err(|e| CryptoError::MalformedPacket(e.to_string()))?;
        message
            .to_armored_string(ArmorOptions::default())
            .map_err(|e| CryptoError::MalformedArmor(e.to_string()))
    }
}

/// Decrypted literal data. `signature` is the binary signature packet that accompanied it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralData {
    pub content: Vec<u8>,
    pub signature: Option<Vec<u8>>,
}
