//! The deployment handle.

use tether_store::{EnvironmentStore, EnvironmentTag, StoreConfig};
use tether_system::ledger::{Ledger, MemoryLedger};

use crate::engine::WiringEngine;
use crate::error::WiringError;
use crate::inject::{Resolved, wire_all};
use crate::lookup::Lookup;
use crate::request::WiringPlan;

/// Owns the store and ledger one deployment run works against.
///
/// There is no global state: everything that wires or looks up resources
/// goes through a handle like this one.
///
/// # Example
///
/// ```no_run
/// use tether_store::StoreConfig;
/// use tether_system::catalog::ResourceKind;
/// use tether_system::ledger::MemoryLedger;
/// use tether_wiring::deployment::Deployment;
///
/// # fn main() -> Result<(), tether_wiring::error::WiringError> {
/// let mut deployment = Deployment::open(StoreConfig::new("deployments"), "debug", MemoryLedger::new())?;
/// let faucet = deployment.engine().plain(ResourceKind::Faucet)?;
/// assert_eq!(deployment.lookup().resolve(ResourceKind::Faucet, None)?, faucet);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Deployment<L: Ledger = MemoryLedger> {
    store: EnvironmentStore,
    ledger: L,
}

impl<L: Ledger> Deployment<L> {
    /// Wraps an existing store and ledger.
    pub fn new(store: EnvironmentStore, ledger: L) -> Self {
        Self { store, ledger }
    }

    /// Opens a store under `config` and selects `environment`.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::Store`] if the environment cannot be loaded.
    pub fn open(config: StoreConfig, environment: &str, ledger: L) -> Result<Self, WiringError> {
        let store = EnvironmentStore::open(config, environment)?;
        Ok(Self::new(store, ledger))
    }

    /// Switches the active environment.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::Store`] if the environment cannot be loaded.
    pub fn select(&mut self, environment: &str) -> Result<(), WiringError> {
        self.store.select(environment)?;
        Ok(())
    }

    /// The active environment, if one is selected.
    pub fn environment(&self) -> Option<&EnvironmentTag> {
        self.store.active_tag()
    }

    /// An engine borrowing this deployment's store and ledger.
    pub fn engine(&mut self) -> WiringEngine<'_> {
        WiringEngine::new(&mut self.store, &mut self.ledger)
    }

    /// Read-only lookups over the active environment.
    pub fn lookup(&self) -> Lookup<'_> {
        Lookup::new(&self.store)
    }

    /// Decodes every step of `plan`, then wires them in order.
    ///
    /// A plan with any bad step wires nothing.
    ///
    /// # Errors
    ///
    /// Returns decoding errors before any side effect, then the first wiring
    /// error.
    pub fn run_plan(&mut self, plan: &WiringPlan) -> Result<Vec<Resolved>, WiringError> {
        let requests = plan.requests()?;
        wire_all(&mut self.engine(), &requests)
    }

    /// Flushes any deferred store writes.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::Store`] on flush failure.
    pub fn flush(&mut self) -> Result<(), WiringError> {
        self.store.flush()?;
        Ok(())
    }

    /// The environment store.
    pub fn store(&self) -> &EnvironmentStore {
        &self.store
    }

    /// The ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Consumes the handle.
    pub fn into_parts(self) -> (EnvironmentStore, L) {
        (self.store, self.ledger)
    }
}
