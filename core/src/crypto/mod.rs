/*
 * mod.rs
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

//! OpenPGP for outbound messages: session keys, key material, split messages and the backend
//! trait with its rpgp implementation.

mod backend;
mod codec;
mod error;
mod keys;
pub mod packet;
mod rpgp;
mod session_key;

pub use backend::PgpBackend;
pub use codec::SessionKeyCodec;
pub use error::CryptoError;
pub use keys::{
    KeyId, LockedPrivateKey, PublicKey, SenderKeyRing, UnlockedKeyRing, UnlockedPrivateKey, DEFAULT_S2K_COUNT,
};
pub use packet::{EncryptedSplit, LiteralData};
pub use rpgp::RpgpBackend;
pub use session_key::{SessionKey, SymmetricAlgorithm};
