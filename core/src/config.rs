/*
 * config.rs
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

//! Send engine settings, loaded from a small XML document so they can sit next to the rest of
//! the client's XML configuration. All XML read/write uses the quick_xml reader/writer.
//!
//! ```xml
//! <send>
//!   <auto-save-contacts>true</auto-save-contacts>
//!   <max-parallelism>4</max-parallelism>
//!   <check-boundary-collision>true</check-boundary-collision>
//!   <boundary-attempts>4</boundary-attempts>
//!   <require-all-recipients>true</require-all-recipients>
//! </send>
//! ```

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use thiserror::Error;

const ROOT: &[u8] = b"send";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("invalid value {value:?} for <{element}>")]
    InvalidValue { element: String, value: String },
}

/// Settings for one send pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConfig {
    /// Copied into the payload's `autoSaveContacts` flag.
    pub auto_save_contacts: bool,
    /// Worker threads for recipient and attachment fan-out. 0 uses rayon's global pool.
    pub max_parallelism: usize,
    pub check_boundary_collision: bool,
    /// Boundaries tried before giving up on a collision. Always at least 1.
    pub boundary_attempts: usize,
    /// Fail the send when any recipient cannot be given a package. When false, dropped
    /// recipients are logged and the rest are sent to.
    pub require_all_recipients: bool,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            auto_save_contacts: false,
            max_parallelism: 0,
            check_boundary_collision: true,
            boundary_attempts: 4,
            require_all_recipients: true,
        }
    }
}

impl SendConfig {
    /// Read settings from an XML file. Missing elements keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_xml(&content)
    }

    /// Parse settings from XML text. Unknown elements are ignored.
    pub fn from_xml(content: &str) -> Result<Self, ConfigError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut config = SendConfig::default();
        let mut in_root = false;
        let mut element_name = Vec::<u8>::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(ConfigError::Xml(e.to_string())),
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    let name = name.as_ref();
                    if name == ROOT {
                        in_root = true;
                    } else if in_root {
                        element_name.clear();
                        element_name.extend_from_slice(name);
                    }
                }
                Ok(Event::Text(e)) => {
                    if !in_root || element_name.is_empty() {
                        continue;
                    }
                    let text = e
                        .unescape()
                        .map_err(|e| ConfigError::Xml(e.to_string()))?
                        .trim()
                        .to_string();
                    config.apply(&element_name, &text)?;
                    element_name.clear();
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == ROOT {
                        in_root = false;
                    }
                    element_name.clear();
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(config)
    }

    fn apply(&mut self, element: &[u8], text: &str) -> Result<(), ConfigError> {
        match element {
            b"auto-save-contacts" => self.auto_save_contacts = parse_bool(element, text)?,
            b"max-parallelism" => self.max_parallelism = parse_usize(element, text)?,
            b"check-boundary-collision" => {
                self.check_boundary_collision = parse_bool(element, text)?
            }
            b"boundary-attempts" => {
                let n = parse_usize(element, text)?;
                if n == 0 {
                    return Err(invalid(element, text));
                }
                self.boundary_attempts = n;
            }
            b"require-all-recipients" => {
                self.require_all_recipients = parse_bool(element, text)?
            }
            _ => {}
        }
        Ok(())
    }

    /// Serialize to the XML form read by [`SendConfig::from_xml`].
    pub fn to_xml(&self) -> Result<Vec<u8>, ConfigError> {
        let mut out = Vec::new();
        let mut writer = Writer::new_with_indent(&mut out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| ConfigError::Xml(e.to_string()))?;
        writer
            .write_event(Event::Start(BytesStart::new("send")))
            .map_err(|e| ConfigError::Xml(e.to_string()))?;
        let fields = [
            ("auto-save-contacts", self.auto_save_contacts.to_string()),
            ("max-parallelism", self.max_parallelism.to_string()),
            ("check-boundary-collision", self.check_boundary_collision.to_string()),
            ("boundary-attempts", self.boundary_attempts.to_string()),
            ("require-all-recipients", self.require_all_recipients.to_string()),
        ];
        for (name, value) in &fields {
            writer
                .write_event(Event::Start(BytesStart::new(*name)))
                .map_err(|e| ConfigError::Xml(e.to_string()))?;
            writer
                .write_event(Event::Text(BytesText::new(value.as_str())))
                .map_err(|e| ConfigError::Xml(e.to_string()))?;
            writer
                .write_event(Event::End(BytesEnd::new(*name)))
                .map_err(|e| ConfigError::Xml(e.to_string()))?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("send")))
            .map_err(|e| ConfigError::Xml(e.to_string()))?;
        Ok(out)
    }

    /// Write settings to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_xml()?)?;
        Ok(())
    }
}

fn parse_bool(element: &[u8], text: &str) -> Result<bool, ConfigError> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(element, text)),
    }
}

fn parse_usize(element: &[u8], text: &str) -> Result<usize, ConfigError> {
    text.parse().map_err(|_| invalid(element, text))
}

fn invalid(element: &[u8], text: &str) -> ConfigError {
    ConfigError::InvalidValue {
        element: String::from_utf8_lossy(element).into_owned(),
        value: text.to_string(),
    }
}
