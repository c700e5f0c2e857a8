/*
 * classifier.rs
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

//! Assign each recipient to one of four encoding buckets.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use super::preference::{PackageType, SendPreference};

/// Encoding a recipient's copy ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    ProtonMail,
    Cleartext,
    ClearMime,
    PgpMime,
}

/// Why a recipient was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    PublicKeyMissing,
    UnsupportedScheme(PackageType),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::PublicKeyMissing => f.write_str("public key missing"),
            DropReason::UnsupportedScheme(t) => write!(f, "unsupported scheme {:?}", t),
        }
    }
}

/// Result of classifying a recipient map. Every input recipient is in exactly one of
/// `assigned` or `dropped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    assigned: BTreeMap<String, Bucket>,
    dropped: BTreeMap<String, DropReason>,
}

impl Classification {
    pub fn bucket(&self, recipient: &str) -> Option<Bucket> {
        self.assigned.get(recipient).copied()
    }

    /// Recipients in `bucket`, in map order.
    pub fn recipients(&self, bucket: Bucket) -> impl Iterator<Item = &str> + '_ {
        self.assigned
            .iter()
            .filter(move |(_, b)| **b == bucket)
            .map(|(r, _)| r.as_str())
    }

    pub fn assigned(&self) -> &BTreeMap<String, Bucket> {
        &self.assigned
    }

    pub fn dropped(&self) -> &BTreeMap<String, DropReason> {
        &self.dropped
    }

    pub fn eligible_count(&self) -> usize {
        self.assigned.len()
    }

    pub fn has(&self, bucket: Bucket) -> bool {
        self.assigned.values().any(|b| *b == bucket)
    }
}

pub struct RecipientClassifier;

impl RecipientClassifier {
    /// Bucket for one preference. The scheme is refined by the encrypt/sign flags.
    pub fn classify_one(pref: &SendPreference) -> Result<Bucket, DropReason> {
        match pref.pgp_scheme {
            PackageType::ProtonMail => {
                if pref.public_key.is_some() {
                    Ok(Bucket::ProtonMail)
                } else {
                    Err(DropReason::PublicKeyMissing)
                }
            }
            PackageType::Cleartext => {
                if pref.sign {
                    Ok(Bucket::ClearMime)
                } else {
                    Ok(Bucket::Cleartext)
                }
            }
            PackageType::PgpMime => {
                if !pref.encrypt {
                    Ok(Bucket::ClearMime)
                } else if pref.public_key.is_some() {
                    Ok(Bucket::PgpMime)
                } else {
                    Err(DropReason::PublicKeyMissing)
                }
            }
            // Inline PGP is sent as PGP/MIME.
            PackageType::PgpInline => {
                if pref.encrypt {
                    if pref.public_key.is_some() {
                        Ok(Bucket::PgpMime)
                    } else {
                        Err(DropReason::PublicKeyMissing)
                    }
                } else if pref.sign {
                    Ok(Bucket::ClearMime)
                } else {
                    Ok(Bucket::Cleartext)
                }
            }
            PackageType::ClearMime => Ok(Bucket::ClearMime),
            PackageType::EncryptedOutside => Err(DropReason::UnsupportedScheme(PackageType::EncryptedOutside)),
        }
    }

    /// Classify every recipient. Dropped recipients are logged.
    pub fn classify(preferences: &BTreeMap<String, SendPreference>) -> Classification {
        let mut out = Classification::default();
        for (recipient, pref) in preferences {
            match Self::classify_one(pref) {
                Ok(bucket) => {
                    out.assigned.insert(recipient.clone(), bucket);
                }
                Err(reason) => {
                    warn!(recipient = %recipient, reason = %reason, "recipient dropped");
                    out.dropped.insert(recipient.clone(), reason);
                }
            }
        }
        out
    }
}
