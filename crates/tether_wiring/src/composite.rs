//! Composite provisioning units.
//!
//! A [`CompositeUnit`] is a named multi-step routine run by the engine. It
//! reads locations that are already wired, provisions new resources through
//! the engine's plain and nicknamed strategies, and records their entries.
//! Units are built per invocation and never persisted.
//!
//! Units call the ledger in a fixed order:
//!
//! 1. dependencies that wrap nothing
//! 2. wrapping steps
//! 3. initialization
//!
//! Steps that completed before a failure stay recorded.

use tether_system::catalog::ResourceKind;
use tether_system::identity::{Location, Namespace, derive};
use tether_system::key::WiringKey;

use crate::engine::{Provisioned, WiringEngine};
use crate::error::WiringError;

/// A named multi-step provisioning routine.
///
/// # Example
///
/// ```no_run
/// use tether_system::catalog::ResourceKind;
/// use tether_system::identity::Location;
/// use tether_wiring::composite::CompositeUnit;
/// use tether_wiring::engine::WiringEngine;
/// use tether_wiring::error::WiringError;
///
/// struct Treasury;
///
/// impl CompositeUnit for Treasury {
///     fn name(&self) -> &str {
///         "treasury"
///     }
///
///     fn run(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
///         engine.plain(ResourceKind::FeeCollector)?;
///         engine.plain(ResourceKind::ClaimVault)?;
///         Ok(None)
///     }
/// }
/// ```
pub trait CompositeUnit {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Runs the unit, returning its outward-facing location if it has one.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    fn run(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError>;
}

/// Fails with [`WiringError::WrapTargetMissing`] unless `kind`'s plain
/// instance is live.
fn require_live(engine: &WiringEngine<'_>, kind: ResourceKind) -> Result<Location, WiringError> {
    let location = derive(kind, None);
    if engine.ledger().is_live(&location) {
        Ok(location)
    } else {
        Err(WiringError::WrapTargetMissing {
            kind: kind.name().to_string(),
            location,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WrapUnit
// ─────────────────────────────────────────────────────────────────────────────

/// Puts `outer` in front of the plain instance of `inner`.
///
/// The outer resource is constructed with the inner location as its argument
/// and recorded under `"<Outer>_<Inner>"`. The inner resource must already be
/// live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapUnit {
    outer: ResourceKind,
    inner: ResourceKind,
}

impl WrapUnit {
    /// Creates a unit wrapping `inner` behind `outer`.
    #[must_use]
    pub fn new(outer: ResourceKind, inner: ResourceKind) -> Self {
        Self { outer, inner }
    }

    /// Key of the outer entry.
    #[must_use]
    pub fn outer_key(&self) -> WiringKey {
        WiringKey::nicknamed(self.outer, Namespace::of_kind(self.inner))
    }

    /// Performs the wrap.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::WrapTargetMissing`] if nothing is live at the
    /// inner location; the failure is not retried.
    pub fn wrap(&self, engine: &mut WiringEngine<'_>) -> Result<Provisioned, WiringError> {
        let inner = require_live(engine, self.inner)?;
        engine.provision(&self.outer_key(), inner.as_bytes())
    }
}

impl CompositeUnit for WrapUnit {
    fn name(&self) -> &str {
        "wrap"
    }

    fn run(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        Ok(Some(self.wrap(engine)?.location))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NamedInstanceUnit
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a named instance of `kind` from its live plain template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedInstanceUnit {
    kind: ResourceKind,
    namespace: Namespace,
}

impl NamedInstanceUnit {
    /// Creates a unit for `kind` under `namespace`.
    #[must_use]
    pub fn new(kind: ResourceKind, namespace: Namespace) -> Self {
        Self { kind, namespace }
    }

    /// Provisions the instance, passing the template location to its
    /// constructor.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::WrapTargetMissing`] if the template is not live.
    pub fn instantiate(&self, engine: &mut WiringEngine<'_>) -> Result<Provisioned, WiringError> {
        let template = require_live(engine, self.kind)?;
        engine.provision(
            &WiringKey::nicknamed(self.kind, self.namespace.clone()),
            template.as_bytes(),
        )
    }
}

impl CompositeUnit for NamedInstanceUnit {
    fn name(&self) -> &str {
        "named-instance"
    }

    fn run(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        Ok(Some(self.instantiate(engine)?.location))
    }
}
