/*
 * lib.rs
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

//! Sigillo send engine: turns an encrypted draft and per-recipient preferences into the
//! encrypted, signed packages a mail server accepts for delivery.

pub mod config;
pub mod crypto;
pub mod json;
pub mod mime;
pub mod send;

pub use config::{ConfigError, SendConfig};
pub use send::{SendError, SendPipeline, SendResult};
