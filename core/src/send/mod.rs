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

//! The send engine: classify recipients, encrypt attachments, assemble per-recipient packages.

mod assembler;
mod attachment;
mod classifier;
mod draft;
mod error;
mod package;
mod pipeline;
mod preference;
mod sink;

pub use assembler::{Assembly, PackageAssembler, PackageInputs};
pub use attachment::{AttachmentEncryptionError, AttachmentEncryptor, AttachmentSource, EncryptedAttachment};
pub use classifier::{Bucket, Classification, DropReason, RecipientClassifier};
pub use draft::{AttachmentFiles, Draft, DraftAttachment};
pub use error::{SendError, SendResult};
pub use package::{AddressPackage, SendMessageBody, SendMessagePackage};
pub use pipeline::SendPipeline;
pub use preference::{PackageType, SendPreference};
pub use sink::{PackageSink, SinkError};
