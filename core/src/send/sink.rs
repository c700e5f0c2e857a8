/*
 * sink.rs
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

//! Where finished packages and encrypted attachments go.

use thiserror::Error;

use super::attachment::EncryptedAttachment;
use super::package::SendMessageBody;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("transport rejected packages: {0}")]
    Rejected(String),
    #[error("attachment upload failed: {0}")]
    Upload(String),
}

/// Transport collaborator. Implementations own retries; the pipeline never retries.
pub trait PackageSink {
    fn submit_packages(&mut self, body: &SendMessageBody) -> Result<(), SinkError>;

    fn upload_attachment(&mut self, id: &str, attachment: &EncryptedAttachment) -> Result<(), SinkError>;
}
