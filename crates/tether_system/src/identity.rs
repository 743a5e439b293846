//! Deterministic identity derivation.
//!
//! [`derive`] maps `(kind, namespace?)` to a [`Location`] without any I/O.
//! The same inputs produce the same location in every process, so a location
//! can be recomputed at any time instead of being remembered.
//!
//! # Algorithm
//!
//! ```text
//! digest   = SHA-256("tether.location.v1" ‖ name ‖ 0x00 ‖ tag ‖ SHA-256(code))
//! tag      = 0x00                     (plain)
//!          | 0x01 ‖ namespace bytes   (nicknamed)
//! location = digest[12..32]
//! ```
//!
//! The tag byte keeps a plain location from ever colliding with a nicknamed
//! one of the same kind.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::catalog::ResourceKind;

/// Domain separator mixed into every derivation.
const DOMAIN: &[u8] = b"tether.location.v1";

/// Maximum length of a namespace, in bytes.
pub const MAX_NAMESPACE_LEN: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Location
// ─────────────────────────────────────────────────────────────────────────────

/// Width of a location, in bytes.
pub const LOCATION_LEN: usize = 20;

/// Deterministic identity of a provisioned resource.
///
/// Rendered as `0x` followed by 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location([u8; LOCATION_LEN]);

/// Errors raised when parsing a [`Location`] from text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationParseError {
    /// The string does not start with `0x`.
    #[error("location must start with 0x: {0:?}")]
    MissingPrefix(String),

    /// The string is not exactly 40 hex digits after the prefix.
    #[error("location must be {expected} hex digits, got {actual}")]
    BadLength {
        /// Expected number of hex digits.
        expected: usize,
        /// Digits actually present.
        actual: usize,
    },

    /// The digits are not valid hex.
    #[error("invalid hex in location: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl Location {
    /// Wraps raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; LOCATION_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; LOCATION_LEN] {
        &self.0
    }

    /// Returns `true` for the all-zero location.
    ///
    /// Derivation never yields it in practice; stores treat it as empty.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location({self})")
    }
}

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| LocationParseError::MissingPrefix(s.to_string()))?;
        if digits.len() != LOCATION_LEN * 2 {
            return Err(LocationParseError::BadLength {
                expected: LOCATION_LEN * 2,
                actual: digits.len(),
            });
        }
        let mut bytes = [0u8; LOCATION_LEN];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Namespace
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised when constructing a [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    /// The namespace is empty.
    #[error("namespace must not be empty")]
    Empty,

    /// The namespace exceeds [`MAX_NAMESPACE_LEN`].
    #[error("namespace {0:?} is longer than {MAX_NAMESPACE_LEN} bytes")]
    TooLong(String),

    /// The namespace contains a character outside `[A-Za-z0-9_.-]`.
    #[error("namespace {namespace:?} contains invalid character {character:?}")]
    InvalidCharacter {
        /// The rejected namespace.
        namespace: String,
        /// The first offending character.
        character: char,
    },
}

/// Caller-chosen label distinguishing several instances of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Validates and wraps a namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`NamespaceError`] if the value is empty, too long, or
    /// contains characters outside `[A-Za-z0-9_.-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, NamespaceError> {
        let value = value.into();
        if value.is_empty() {
            return Err(NamespaceError::Empty);
        }
        if value.len() > MAX_NAMESPACE_LEN {
            return Err(NamespaceError::TooLong(value));
        }
        if let Some(character) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(NamespaceError::InvalidCharacter {
                namespace: value,
                character,
            });
        }
        Ok(Self(value))
    }

    /// Namespace named after a resource kind, as used for wrapped outer keys.
    #[must_use]
    pub fn of_kind(kind: ResourceKind) -> Self {
        Self(kind.name().to_string())
    }

    /// Returns the namespace as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Derivation
// ─────────────────────────────────────────────────────────────────────────────

/// Computes the location of `kind` under an optional namespace.
///
/// Pure and total over the catalog.
///
/// # Example
///
/// ```
/// use tether_system::catalog::ResourceKind;
/// use tether_system::identity::{Namespace, derive};
///
/// let plain = derive(ResourceKind::Faucet, None);
/// assert_eq!(plain, derive(ResourceKind::Faucet, None));
///
/// let named = Namespace::new("usdc").unwrap();
/// assert_ne!(plain, derive(ResourceKind::Faucet, Some(&named)));
/// ```
#[must_use]
pub fn derive(kind: ResourceKind, namespace: Option<&Namespace>) -> Location {
    let code_hash = Sha256::digest(kind.construction_payload().code);

    let mut hasher = Sha256::new();
    hasher.update(DOMAIN);
    hasher.update(kind.name().as_bytes());
    hasher.update([0x00]);
    match namespace {
        None => hasher.update([0x00]),
        Some(namespace) => {
            hasher.update([0x01]);
            hasher.update(namespace.as_str().as_bytes());
        }
    }
    hasher.update(code_hash);
    let digest = hasher.finalize();

    let mut bytes = [0u8; LOCATION_LEN];
    bytes.copy_from_slice(&digest[digest.len() - LOCATION_LEN..]);
    Location(bytes)
}
