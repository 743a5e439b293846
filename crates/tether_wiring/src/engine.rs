//! The wiring engine and its provisioning strategies.
//!
//! | Strategy | Key | Location | Effect when the key is absent |
//! |----------|-----|----------|-------------------------------|
//! | Plain | `Kind` | `derive(kind)` | materialize, record |
//! | Nicknamed | `Kind_ns` | `derive(kind, ns)` | materialize, record |
//! | Composite, bare | unit-defined | none | run the unit |
//! | Composite, wrapped | `Outer_Inner` or `Kind_ns` | outer location | plain inner, then built-in unit |
//!
//! When a key is already recorded, its stored location is returned and
//! nothing is provisioned. When the key is absent but something is already
//! live at the derived location, the engine adopts it and only records the
//! entry.

use tether_store::EnvironmentStore;
use tether_system::catalog::ResourceKind;
use tether_system::identity::{Location, Namespace};
use tether_system::key::WiringKey;
use tether_system::ledger::Ledger;

use crate::composite::{CompositeUnit, NamedInstanceUnit, WrapUnit};
use crate::error::WiringError;
use crate::lookup::{Lookup, stored_location};
use crate::request::{CompositePayload, CompositeRequest, WiringRequest};

/// How a provisioning call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// The key was already recorded; nothing happened.
    Existing,
    /// The resource was already live; only the entry was recorded.
    Adopted,
    /// The resource was materialized and recorded.
    Materialized,
}

/// Outcome of [`WiringEngine::provision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// The entry's key.
    pub key: WiringKey,
    /// The recorded location.
    pub location: Location,
    /// How the call was satisfied.
    pub provisioning: Provisioning,
}

impl Provisioned {
    /// Returns `true` if this call materialized the resource.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.provisioning == Provisioning::Materialized
    }
}

/// Dispatches wiring requests against one store and one ledger.
///
/// The engine borrows both for the duration of a unit of work; see
/// [`Deployment::engine`](crate::deployment::Deployment::engine).
pub struct WiringEngine<'a> {
    store: &'a mut EnvironmentStore,
    ledger: &'a mut dyn Ledger,
}

impl<'a> WiringEngine<'a> {
    /// Creates an engine over `store` and `ledger`.
    pub fn new(store: &'a mut EnvironmentStore, ledger: &'a mut dyn Ledger) -> Self {
        Self { store, ledger }
    }

    /// The environment store.
    #[must_use]
    pub fn store(&self) -> &EnvironmentStore {
        self.store
    }

    /// The ledger.
    #[must_use]
    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger
    }

    /// Read-only lookups over the active environment.
    #[must_use]
    pub fn lookup(&self) -> Lookup<'_> {
        Lookup::new(self.store)
    }

    fn ensure_selected(&self) -> Result<(), WiringError> {
        self.store.active()?;
        Ok(())
    }

    /// Wires one request and returns the location it produced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::ConfigurationNotSelected`] before any side
    /// effect if no environment is selected, or whatever the strategy raises.
    pub fn wire(&mut self, request: &WiringRequest) -> Result<Option<Location>, WiringError> {
        self.ensure_selected()?;
        match request {
            WiringRequest::Plain(kind) => self.plain(*kind).map(Some),
            WiringRequest::Nicknamed(kind, namespace) => self.nicknamed(*kind, namespace).map(Some),
            WiringRequest::Composite(CompositeRequest::Bare(unit)) => {
                self.composite(unit.as_ref()).map(|()| None)
            }
            WiringRequest::Composite(CompositeRequest::Wrapped(payload)) => {
                self.wrapped(payload).map(Some)
            }
        }
    }

    /// Decodes a binary request and wires it.
    ///
    /// Decoding completes before anything is read or written.
    ///
    /// # Errors
    ///
    /// See [`WiringRequest::decode`] and [`wire`](Self::wire).
    pub fn wire_bytes(&mut self, bytes: &[u8]) -> Result<Option<Location>, WiringError> {
        let request = WiringRequest::decode(bytes)?;
        self.wire(&request)
    }

    /// Wires the plain instance of `kind`.
    ///
    /// # Errors
    ///
    /// Returns store, ledger or malformed-entry errors.
    pub fn plain(&mut self, kind: ResourceKind) -> Result<Location, WiringError> {
        Ok(self.provision(&WiringKey::plain(kind), &[])?.location)
    }

    /// Wires the instance of `kind` named `namespace`.
    ///
    /// # Errors
    ///
    /// Returns store, ledger or malformed-entry errors.
    pub fn nicknamed(
        &mut self,
        kind: ResourceKind,
        namespace: &Namespace,
    ) -> Result<Location, WiringError> {
        Ok(self
            .provision(&WiringKey::nicknamed(kind, namespace.clone()), &[])?
            .location)
    }

    /// Runs a caller-supplied composite unit.
    ///
    /// The unit performs and records its own steps; nothing it completed is
    /// rolled back if a later step fails.
    ///
    /// # Errors
    ///
    /// Returns whatever the unit raises.
    pub fn composite(&mut self, unit: &dyn CompositeUnit) -> Result<(), WiringError> {
        self.ensure_selected()?;
        tracing::debug!(unit = unit.name(), "running composite");
        unit.run(self)?;
        tracing::info!(unit = unit.name(), "composite complete");
        Ok(())
    }

    /// Runs a built-in composite flow and returns its outer location.
    ///
    /// The underlying resource is fully provisioned and recorded with plain
    /// semantics before the built-in unit starts.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::WrapTargetMissing`] if the underlying resource
    /// is recorded but not live, or any provisioning error.
    pub fn wrapped(&mut self, payload: &CompositePayload) -> Result<Location, WiringError> {
        self.ensure_selected()?;
        let provisioned = match payload {
            CompositePayload::Wrap { outer, inner } => {
                self.plain(*inner)?;
                WrapUnit::new(*outer, *inner).wrap(self)?
            }
            CompositePayload::NamedInstance { kind, namespace } => {
                self.plain(*kind)?;
                NamedInstanceUnit::new(*kind, namespace.clone()).instantiate(self)?
            }
        };
        Ok(provisioned.location)
    }

    /// Provisions the resource behind `key`, passing `args` to its
    /// constructor if it has to be materialized.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::MalformedEntry`] if the key holds something
    /// other than a location, and any store or ledger error.
    pub fn provision(&mut self, key: &WiringKey, args: &[u8]) -> Result<Provisioned, WiringError> {
        let raw = key.to_string();
        let derived = key.derive();

        if let Some(stored) = stored_location(self.store, &raw)? {
            if stored != derived {
                tracing::warn!(
                    key = %raw,
                    %stored,
                    %derived,
                    "recorded location differs from derived location"
                );
            }
            tracing::debug!(key = %raw, location = %stored, "already wired");
            return Ok(Provisioned {
                key: key.clone(),
                location: stored,
                provisioning: Provisioning::Existing,
            });
        }

        let provisioning = if self.ledger.is_live(&derived) {
            tracing::warn!(key = %raw, location = %derived, "adopting live resource without a record");
            Provisioning::Adopted
        } else {
            let kind = key.kind();
            self.ledger
                .materialize(derived, kind, kind.construction_payload(), args)?;
            Provisioning::Materialized
        };

        self.record(key, derived)?;
        tracing::info!("provisioned {} -> {derived}", key.label());
        Ok(Provisioned {
            key: key.clone(),
            location: derived,
            provisioning,
        })
    }

    /// Runs `kind`'s initializer at `location` unless it has already run.
    ///
    /// Returns `false` without touching the ledger if the kind has no
    /// initializer or the resource is already initialized, so an interrupted
    /// run picks up the initializers it missed.
    ///
    /// # Errors
    ///
    /// Returns any ledger error.
    pub fn initialize(
        &mut self,
        kind: ResourceKind,
        location: Location,
        args: &[u8],
    ) -> Result<bool, WiringError> {
        let Some(entrypoint) = kind.construction_payload().initializer else {
            return Ok(false);
        };
        if self.ledger.is_initialized(&location) {
            tracing::debug!("{kind} at {location} already initialized");
            return Ok(false);
        }
        self.ledger.initialize(location, entrypoint, args)?;
        tracing::info!("initialized {kind}::{entrypoint} -> {location}");
        Ok(true)
    }

    /// Records `location` under `key` in the active environment.
    ///
    /// # Errors
    ///
    /// Returns any store error.
    pub fn record(&mut self, key: &WiringKey, location: Location) -> Result<(), WiringError> {
        self.store.set(&key.to_string(), location)?;
        Ok(())
    }
}
