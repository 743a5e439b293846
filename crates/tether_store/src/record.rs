//! Environment records and their on-disk document.
//!
//! Each environment is stored as one TOML document with a single top-level
//! `[wiring]` section holding a flat map of string keys to primitive values:
//!
//! ```toml
//! [wiring]
//! Faucet = "0x3f5c…"
//! Proxy_GuardianRecovery = "0x91aa…"
//! deployed_block = 1204
//! ```
//!
//! Records are always written back in full; keys come out sorted so repeated
//! writes of the same state produce identical bytes.

use core::fmt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tether_system::identity::Location;

use crate::error::StoreError;

/// Maximum length of an environment tag.
const MAX_TAG_LEN: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// EnvironmentTag
// ─────────────────────────────────────────────────────────────────────────────

/// Name of a deployment target scope, such as `debug` or `production`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvironmentTag(String);

impl EnvironmentTag {
    /// Validates a tag. Tags double as file names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTag`] unless the tag is 1 to 32 characters
    /// from `[A-Za-z0-9_-]`.
    pub fn new(tag: impl Into<String>) -> Result<Self, StoreError> {
        let tag = tag.into();
        let valid = !tag.is_empty()
            && tag.len() <= MAX_TAG_LEN
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        if valid {
            Ok(Self(tag))
        } else {
            Err(StoreError::InvalidTag(tag))
        }
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EnvironmentTag {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvironmentTag> for String {
    fn from(tag: EnvironmentTag) -> Self {
        tag.0
    }
}

impl fmt::Display for EnvironmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WiringValue
// ─────────────────────────────────────────────────────────────────────────────

/// A primitive value stored in an environment record.
///
/// Locations are stored as [`Text`](Self::Text) in their `0x…` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WiringValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A string, including rendered locations.
    Text(String),
}

impl WiringValue {
    /// Returns the string content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` for an empty text value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl fmt::Display for WiringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<Location> for WiringValue {
    fn from(location: Location) -> Self {
        Self::Text(location.to_string())
    }
}

impl From<&str> for WiringValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for WiringValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for WiringValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for WiringValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EnvironmentRecord
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk shape of an environment document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct EnvironmentDocument {
    #[serde(default)]
    wiring: BTreeMap<String, WiringValue>,
}

/// SHA-256 of a file's bytes, used to detect foreign writes.
pub(crate) type Fingerprint = [u8; 32];

pub(crate) fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Sha256::digest(bytes).into()
}

/// The cached wiring state of one environment.
#[derive(Debug, Clone)]
pub struct EnvironmentRecord {
    tag: EnvironmentTag,
    path: PathBuf,
    entries: BTreeMap<String, WiringValue>,
    /// Fingerprint of the bytes last read from or written to `path`.
    /// `None` if the file did not exist at that point.
    fingerprint: Option<Fingerprint>,
    dirty: bool,
}

impl EnvironmentRecord {
    /// Loads the record for `tag` from `path`.
    ///
    /// A missing file yields an empty record.
    pub(crate) fn load(tag: EnvironmentTag, path: PathBuf) -> Result<Self, StoreError> {
        let (entries, fingerprint) = match std::fs::read(&path) {
            Ok(bytes) => {
                let text = core::str::from_utf8(&bytes).map_err(|source| StoreError::NotUtf8 {
                    path: path.clone(),
                    source,
                })?;
                let document: EnvironmentDocument =
                    toml::from_str(text).map_err(|source| StoreError::Corrupted {
                        path: path.clone(),
                        source,
                    })?;
                (document.wiring, Some(fingerprint(&bytes)))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (BTreeMap::new(), None),
            Err(err) => return Err(StoreError::io(&path, err)),
        };

        Ok(Self {
            tag,
            path,
            entries,
            fingerprint,
            dirty: false,
        })
    }

    /// The environment this record belongs to.
    #[must_use]
    pub fn tag(&self) -> &EnvironmentTag {
        &self.tag
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&WiringValue> {
        self.entries.get(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WiringValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the record has changes not yet flushed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn insert(&mut self, key: String, value: WiringValue) -> Option<WiringValue> {
        let previous = self.entries.insert(key, value.clone());
        if previous.as_ref() != Some(&value) {
            self.dirty = true;
        }
        previous
    }

    /// Undoes an [`insert`](Self::insert) that could not be persisted.
    pub(crate) fn revert(&mut self, key: &str, previous: Option<WiringValue>, dirty: bool) {
        match previous {
            Some(value) => {
                self.entries.insert(key.to_string(), value);
            }
            None => {
                self.entries.remove(key);
            }
        }
        self.dirty = dirty;
    }

    /// Renders the full document.
    pub(crate) fn render(&self) -> Result<String, StoreError> {
        let document = EnvironmentDocument {
            wiring: self.entries.clone(),
        };
        toml::to_string_pretty(&document).map_err(|source| StoreError::Serialize {
            tag: self.tag.to_string(),
            source,
        })
    }

    /// Writes the full record back to its file.
    ///
    /// Fails with [`StoreError::ConcurrentModification`] if the file no
    /// longer matches what this record last saw, leaving it untouched.
    pub(crate) fn flush(&mut self) -> Result<(), StoreError> {
        let on_disk = match std::fs::read(&self.path) {
            Ok(bytes) => Some(fingerprint(&bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };
        if on_disk != self.fingerprint {
            return Err(StoreError::ConcurrentModification {
                path: self.path.clone(),
            });
        }

        let rendered = self.render()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }
        let staging = self.path.with_extension("toml.tmp");
        std::fs::write(&staging, rendered.as_bytes()).map_err(|err| StoreError::io(&staging, err))?;
        std::fs::rename(&staging, &self.path).map_err(|err| StoreError::io(&self.path, err))?;

        self.fingerprint = Some(fingerprint(rendered.as_bytes()));
        self.dirty = false;
        tracing::debug!(
            environment = %self.tag,
            entries = self.entries.len(),
            path = %self.path.display(),
            "environment flushed"
        );
        Ok(())
    }
}
