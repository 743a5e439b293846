//! Ready-made composite units for the bundled catalog.

use tether_system::catalog::ResourceKind;
use tether_system::identity::{Location, Namespace};
use tether_system::key::WiringKey;

use crate::composite::{CompositeUnit, WrapUnit};
use crate::engine::WiringEngine;
use crate::error::WiringError;

/// A fungible token with its own faucet, sharing the plain fee collector.
///
/// | Step | Key | Constructor args |
/// |------|-----|------------------|
/// | fee collector | `FeeCollector` | none |
/// | token | `FungibleToken_<ns>` | namespace bytes |
/// | faucet | `Faucet_<ns>` | token location |
/// | `initialize` on token | | fee collector location |
/// | `configure` on faucet | | token location |
///
/// Initializers that have not run yet are run on every invocation, so a suite
/// interrupted partway finishes on the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSuite {
    namespace: Namespace,
}

impl TokenSuite {
    /// Creates a suite for the token named `namespace`.
    #[must_use]
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// The token's namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl CompositeUnit for TokenSuite {
    fn name(&self) -> &str {
        "token-suite"
    }

    fn run(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        let fees = engine.plain(ResourceKind::FeeCollector)?;
        let token = engine.provision(
            &WiringKey::nicknamed(ResourceKind::FungibleToken, self.namespace.clone()),
            self.namespace.as_str().as_bytes(),
        )?;
        let faucet = engine.provision(
            &WiringKey::nicknamed(ResourceKind::Faucet, self.namespace.clone()),
            token.location.as_bytes(),
        )?;

        engine.initialize(ResourceKind::FungibleToken, token.location, fees.as_bytes())?;
        engine.initialize(ResourceKind::Faucet, faucet.location, token.location.as_bytes())?;
        Ok(Some(faucet.location))
    }
}

/// Guardian recovery behind a proxy, reporting to the address registry.
///
/// Provisions `AddressReport` and `GuardianRecovery`, wraps the latter behind
/// a `Proxy` recorded as `Proxy_GuardianRecovery`, then runs the recovery's
/// `setup` through the proxy with the registry location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoverySuite;

impl CompositeUnit for RecoverySuite {
    fn name(&self) -> &str {
        "recovery-suite"
    }

    fn run(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        let report = engine.plain(ResourceKind::AddressReport)?;
        engine.plain(ResourceKind::GuardianRecovery)?;

        let proxy = WrapUnit::new(ResourceKind::Proxy, ResourceKind::GuardianRecovery).wrap(engine)?;

        engine.initialize(ResourceKind::GuardianRecovery, proxy.location, report.as_bytes())?;
        Ok(Some(proxy.location))
    }
}
