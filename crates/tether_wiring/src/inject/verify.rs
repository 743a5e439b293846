//! Post-condition checks for verifying decorators.

use tether_system::catalog::ResourceKind;
use tether_system::identity::{Location, Namespace};
use tether_system::key::WiringKey;

use crate::engine::WiringEngine;
use crate::error::WiringError;

/// A `(kind, namespace?)` pair that must be live once the body has run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expectation {
    key: WiringKey,
}

impl Expectation {
    /// Expects the plain instance of `kind`.
    #[must_use]
    pub fn plain(kind: ResourceKind) -> Self {
        Self {
            key: WiringKey::plain(kind),
        }
    }

    /// Expects the instance of `kind` named `namespace`.
    #[must_use]
    pub fn nicknamed(kind: ResourceKind, namespace: Namespace) -> Self {
        Self {
            key: WiringKey::nicknamed(kind, namespace),
        }
    }

    /// Expects whatever `key` names.
    #[must_use]
    pub fn for_key(key: WiringKey) -> Self {
        Self { key }
    }

    /// The expected entry's key.
    #[must_use]
    pub fn key(&self) -> &WiringKey {
        &self.key
    }

    /// Derives the expected location.
    pub(crate) fn arm(&self) -> Armed<'_> {
        Armed {
            expectation: self,
            expected: self.key.derive(),
        }
    }
}

impl From<ResourceKind> for Expectation {
    fn from(kind: ResourceKind) -> Self {
        Self::plain(kind)
    }
}

impl From<WiringKey> for Expectation {
    fn from(key: WiringKey) -> Self {
        Self::for_key(key)
    }
}

/// An expectation whose location was derived before the body ran.
#[derive(Debug)]
pub(crate) struct Armed<'e> {
    expectation: &'e Expectation,
    expected: Location,
}

impl Armed<'_> {
    /// Checks the expected location is live.
    pub(crate) fn check(&self, engine: &WiringEngine<'_>) -> Result<(), WiringError> {
        let key = &self.expectation.key;
        if engine.ledger().is_live(&self.expected) {
            tracing::debug!("verified {} -> {}", key.label(), self.expected);
            return Ok(());
        }

        let found = engine
            .store()
            .get(&key.to_string())?
            .map(ToString::to_string);
        tracing::warn!(
            key = %key,
            expected = %self.expected,
            found = found.as_deref().unwrap_or("nothing"),
            "verification failed"
        );
        Err(WiringError::VerificationFailed {
            kind: key.kind().name().to_string(),
            namespace: key.namespace().map(ToString::to_string),
            expected: self.expected,
            found,
        })
    }
}
