//! Bundled composite suites.

mod common;

use common::{Harness, ns};
use tether_system::catalog::{ConstructionPayload, ResourceKind};
use tether_system::identity::{Location, derive};
use tether_system::ledger::{Ledger, LedgerError, MemoryLedger};
use tether_wiring::deployment::Deployment;
use tether_wiring::prelude::*;

/// Shares a [`MemoryLedger`] but rejects the first faucet materialization.
struct FaucetOutage {
    inner: MemoryLedger,
    tripped: bool,
}

impl Ledger for FaucetOutage {
    fn materialize(
        &mut self,
        location: Location,
        kind: ResourceKind,
        payload: &ConstructionPayload,
        args: &[u8],
    ) -> Result<(), LedgerError> {
        if kind == ResourceKind::Faucet && !self.tripped {
            self.tripped = true;
            return Err(LedgerError::Rejected("faucet outage".to_string()));
        }
        self.inner.materialize(location, kind, payload, args)
    }

    fn initialize(&mut self, location: Location, entrypoint: &str, args: &[u8]) -> Result<(), LedgerError> {
        self.inner.initialize(location, entrypoint, args)
    }

    fn is_live(&self, location: &Location) -> bool {
        self.inner.is_live(location)
    }

    fn is_initialized(&self, location: &Location) -> bool {
        self.inner.is_initialized(location)
    }
}

#[test]
fn token_suite_wires_and_initializes_once() {
    let harness = Harness::new();
    let suite = TokenSuite::new(ns("usdc"));

    harness.run("debug").engine().composite(&suite).unwrap();
    assert_eq!(harness.ledger.materializations(), 3);

    let run = harness.run("debug");
    let lookup = run.lookup();
    let token = lookup.resolve_named(ResourceKind::FungibleToken, "usdc").unwrap();
    let faucet = lookup.resolve_named(ResourceKind::Faucet, "usdc").unwrap();
    let fees = lookup.resolve(ResourceKind::FeeCollector, None).unwrap();

    let faucet_state = harness.ledger.resource(&faucet).unwrap();
    assert_eq!(faucet_state.args, hex(token));
    assert_eq!(
        faucet_state.initialized,
        Some(("configure".to_string(), hex(token)))
    );
    assert_eq!(
        harness.ledger.resource(&token).unwrap().initialized,
        Some(("initialize".to_string(), hex(fees)))
    );

    // Re-running finds everything recorded and does not initialize twice.
    harness.run("debug").engine().composite(&suite).unwrap();
    assert_eq!(harness.ledger.materializations(), 3);
}

#[test]
fn interrupted_token_suite_initializes_on_rerun() {
    let harness = Harness::new();
    let suite = TokenSuite::new(ns("usdc"));
    let token = derive(ResourceKind::FungibleToken, Some(&ns("usdc")));
    let fees = derive(ResourceKind::FeeCollector, None);

    let ledger = FaucetOutage {
        inner: harness.ledger.clone(),
        tripped: false,
    };
    let mut first = Deployment::open(harness.config(), "debug", ledger).unwrap();
    let err = first.engine().composite(&suite).unwrap_err();
    assert!(matches!(err, WiringError::Ledger(LedgerError::Rejected(_))));
    drop(first);

    // The token survived the failure but never reached its initializer.
    assert_eq!(harness.ledger.materializations(), 2);
    assert_eq!(harness.ledger.resource(&token).unwrap().initialized, None);
    assert_eq!(
        harness.run("debug").lookup().resolve_named(ResourceKind::FungibleToken, "usdc").unwrap(),
        token
    );

    let mut second = harness.run("debug");
    second.engine().composite(&suite).unwrap();
    assert_eq!(harness.ledger.materializations(), 3);

    let faucet = second.lookup().resolve_named(ResourceKind::Faucet, "usdc").unwrap();
    assert_eq!(
        harness.ledger.resource(&token).unwrap().initialized,
        Some(("initialize".to_string(), hex(fees)))
    );
    assert_eq!(
        harness.ledger.resource(&faucet).unwrap().initialized,
        Some(("configure".to_string(), hex(token)))
    );

    // A third run has nothing left to do.
    harness.run("debug").engine().composite(&suite).unwrap();
    assert_eq!(harness.ledger.materializations(), 3);
}

#[test]
fn token_suites_share_the_fee_collector() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    run.engine().composite(&TokenSuite::new(ns("usdc"))).unwrap();
    run.engine().composite(&TokenSuite::new(ns("dai"))).unwrap();

    assert_eq!(harness.ledger.materializations(), 5);
    assert_eq!(run.lookup().entries().unwrap().len(), 5);
}

#[test]
fn recovery_suite_initializes_through_the_proxy() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    run.engine().composite(&RecoverySuite).unwrap();

    let lookup = run.lookup();
    let report = lookup.resolve(ResourceKind::AddressReport, None).unwrap();
    let recovery = lookup.resolve(ResourceKind::GuardianRecovery, None).unwrap();
    let proxy = lookup.resolve_named(ResourceKind::Proxy, "GuardianRecovery").unwrap();

    assert_eq!(recovery, derive(ResourceKind::GuardianRecovery, None));
    let proxy_state = harness.ledger.resource(&proxy).unwrap();
    assert_eq!(proxy_state.kind, "Proxy");
    assert_eq!(proxy_state.args, hex(recovery));
    assert_eq!(proxy_state.initialized, Some(("setup".to_string(), hex(report))));
}

#[test]
fn recovery_suite_is_a_verified_requirement() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    Routine::new("recovery")
        .inject(WiringRequest::bare(RecoverySuite))
        .verify([
            Expectation::plain(ResourceKind::AddressReport),
            Expectation::nicknamed(ResourceKind::Proxy, ns("GuardianRecovery")),
        ])
        .run(&mut run.engine(), |_| Ok(()))
        .unwrap();
}

fn hex(location: tether_system::identity::Location) -> String {
    location.to_string().trim_start_matches("0x").to_string()
}
