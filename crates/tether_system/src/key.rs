//! Wiring keys.
//!
//! A persisted wiring entry is keyed by `"<Kind>"` for the plain instance of a
//! kind and by `"<Kind>_<Namespace>"` for a nicknamed instance. Kind names
//! never contain `_`, so the first underscore always separates the kind from
//! the namespace and external tools can reconstruct both from a raw key.

use core::fmt;
use core::str::FromStr;

use crate::catalog::{CatalogError, ResourceKind};
use crate::identity::{Location, Namespace, NamespaceError, derive};

/// Separator between kind name and namespace.
pub const SEPARATOR: char = '_';

/// Errors raised when parsing a raw key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The kind part is not in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The namespace part is invalid.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Identifies one wiring entry: a kind plus an optional namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WiringKey {
    kind: ResourceKind,
    namespace: Option<Namespace>,
}

impl WiringKey {
    /// Key of the plain instance of `kind`.
    #[must_use]
    pub fn plain(kind: ResourceKind) -> Self {
        Self {
            kind,
            namespace: None,
        }
    }

    /// Key of the instance of `kind` named `namespace`.
    #[must_use]
    pub fn nicknamed(kind: ResourceKind, namespace: Namespace) -> Self {
        Self {
            kind,
            namespace: Some(namespace),
        }
    }

    /// Key with an optional namespace.
    #[must_use]
    pub fn new(kind: ResourceKind, namespace: Option<Namespace>) -> Self {
        Self { kind, namespace }
    }

    /// Parses a raw `"<Kind>"` or `"<Kind>_<Namespace>"` key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the kind is unknown or the namespace invalid.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        match raw.split_once(SEPARATOR) {
            None => Ok(Self::plain(ResourceKind::from_name(raw)?)),
            Some((kind, namespace)) => Ok(Self::nicknamed(
                ResourceKind::from_name(kind)?,
                Namespace::new(namespace)?,
            )),
        }
    }

    /// The resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The namespace, if this is a nicknamed key.
    #[must_use]
    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    /// Location this key derives to.
    #[must_use]
    pub fn derive(&self) -> Location {
        derive(self.kind, self.namespace.as_ref())
    }

    /// Human-readable label, `kind` or `kind/namespace`, used in diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.namespace {
            None => self.kind.name().to_string(),
            Some(namespace) => format!("{}/{namespace}", self.kind),
        }
    }
}

impl fmt::Display for WiringKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            None => f.write_str(self.kind.name()),
            Some(namespace) => write!(f, "{}{SEPARATOR}{namespace}", self.kind),
        }
    }
}

impl FromStr for WiringKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A persisted `(key, location)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringEntry {
    /// The entry's key.
    pub key: WiringKey,
    /// The recorded location.
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_key_shape() {
        let key = WiringKey::plain(ResourceKind::Faucet);
        assert_eq!(key.to_string(), "Faucet");
        assert_eq!(key.label(), "Faucet");
    }

    #[test]
    fn nicknamed_key_shape() {
        let key = WiringKey::nicknamed(ResourceKind::Faucet, Namespace::new("usdc").unwrap());
        assert_eq!(key.to_string(), "Faucet_usdc");
        assert_eq!(key.label(), "Faucet/usdc");
    }

    #[test]
    fn parse_splits_on_first_separator() {
        let key = WiringKey::parse("FungibleToken_usdc_v2").unwrap();
        assert_eq!(key.kind(), ResourceKind::FungibleToken);
        assert_eq!(key.namespace().map(Namespace::as_str), Some("usdc_v2"));
    }

    #[test]
    fn parse_round_trips_outer_keys() {
        let key = WiringKey::parse("Proxy_GuardianRecovery").unwrap();
        assert_eq!(
            key,
            WiringKey::nicknamed(
                ResourceKind::Proxy,
                Namespace::of_kind(ResourceKind::GuardianRecovery)
            )
        );
        assert_eq!(key.to_string(), "Proxy_GuardianRecovery");
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!(matches!(
            WiringKey::parse("Bridge_main"),
            Err(KeyError::Catalog(CatalogError::UnknownResourceKind(name))) if name == "Bridge"
        ));
    }

    #[test]
    fn parse_rejects_empty_namespace() {
        assert_eq!(
            WiringKey::parse("Faucet_"),
            Err(KeyError::Namespace(NamespaceError::Empty))
        );
    }

    #[test]
    fn key_derive_matches_identity() {
        let ns = Namespace::new("a").unwrap();
        let key = WiringKey::nicknamed(ResourceKind::ClaimVault, ns.clone());
        assert_eq!(key.derive(), derive(ResourceKind::ClaimVault, Some(&ns)));
    }
}
