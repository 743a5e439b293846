//! Injection and verifying decorators.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{Harness, ns};
use tether_system::catalog::ResourceKind;
use tether_system::identity::{Location, derive};
use tether_system::key::WiringKey;
use tether_wiring::prelude::*;

#[test]
fn resources_are_wired_before_the_body() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    let faucet = inject(
        &mut run.engine(),
        (ResourceKind::FeeCollector, ResourceKind::Faucet),
        |engine| {
            assert_eq!(harness.ledger.materializations(), 2);
            engine.lookup().resolve(ResourceKind::Faucet, None)
        },
    )
    .unwrap();

    assert_eq!(faucet, derive(ResourceKind::Faucet, None));
}

#[test]
fn declaration_order_does_not_change_the_outcome() {
    let forward = Harness::new();
    let backward = Harness::new();
    let usdc = || WiringKey::nicknamed(ResourceKind::FungibleToken, ns("usdc"));

    inject(
        &mut forward.run("debug").engine(),
        (ResourceKind::Faucet, usdc(), ResourceKind::Proxy),
        |_| Ok(()),
    )
    .unwrap();
    inject(
        &mut backward.run("debug").engine(),
        (ResourceKind::Proxy, usdc(), ResourceKind::Faucet),
        |_| Ok(()),
    )
    .unwrap();

    assert_eq!(forward.contents("debug"), backward.contents("debug"));
    assert_eq!(
        forward.ledger.materializations(),
        backward.ledger.materializations()
    );
}

#[test]
fn verified_injection_passes_when_everything_is_live() {
    let harness = Harness::new();
    let mut run = harness.run("debug");
    let usdc = WiringRequest::nicknamed(ResourceKind::FungibleToken, "usdc").unwrap();

    let ran = inject_verified(&mut run.engine(), (ResourceKind::Faucet, usdc), |_| Ok(true)).unwrap();
    assert!(ran);
}

#[test]
fn ten_resources_in_one_decorator() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    inject_verified(
        &mut run.engine(),
        (
            ResourceKind::FungibleToken,
            ResourceKind::CollectibleToken,
            ResourceKind::ClaimVault,
            ResourceKind::Faucet,
            ResourceKind::FeeCollector,
            ResourceKind::GuardianRecovery,
            ResourceKind::AddressReport,
            ResourceKind::Proxy,
            WiringKey::nicknamed(ResourceKind::Faucet, ns("a")),
            WiringKey::nicknamed(ResourceKind::Faucet, ns("b")),
        ),
        |_| Ok(()),
    )
    .unwrap();

    assert_eq!(harness.ledger.materializations(), 10);
    assert_eq!(run.lookup().entries().unwrap().len(), 10);
}

#[test]
fn verification_catches_drift_without_rollback() {
    let harness = Harness::new();
    let stale = derive(ResourceKind::Faucet, Some(&ns("elsewhere")));
    std::fs::write(harness.file("debug"), format!("[wiring]\nFaucet = \"{stale}\"\n")).unwrap();

    let mut run = harness.run("debug");
    let body_ran = Rc::new(RefCell::new(false));
    let err = inject_verified(&mut run.engine(), ResourceKind::Faucet, |_| {
        *body_ran.borrow_mut() = true;
        Ok(())
    })
    .unwrap_err();

    assert!(*body_ran.borrow());
    match err {
        WiringError::VerificationFailed {
            kind,
            namespace,
            expected,
            found,
        } => {
            assert_eq!(kind, "Faucet");
            assert_eq!(namespace, None);
            assert_eq!(expected, derive(ResourceKind::Faucet, None));
            assert_eq!(found, Some(stale.to_string()));
        }
        other => panic!("expected VerificationFailed, got {other:?}"),
    }
    assert_eq!(run.lookup().resolve(ResourceKind::Faucet, None).unwrap(), stale);
}

#[test]
fn body_provisioning_another_namespace_fails_verification() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    let err = Routine::new("drift")
        .verify([Expectation::nicknamed(ResourceKind::Faucet, ns("a"))])
        .run(&mut run.engine(), |engine| {
            engine.nicknamed(ResourceKind::Faucet, &ns("b"))?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(
        err,
        WiringError::VerificationFailed { ref kind, namespace: Some(ref namespace), found: None, .. }
            if kind == "Faucet" && namespace == "a"
    ));
    // The body's resource stays wired.
    assert!(run.lookup().resolve_named(ResourceKind::Faucet, "b").is_ok());
}

#[test]
fn verification_of_unwired_pair_reports_nothing_found() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    let err = Routine::new("check")
        .verify([Expectation::nicknamed(ResourceKind::ClaimVault, ns("x"))])
        .run(&mut run.engine(), |_| Ok(()))
        .unwrap_err();

    assert!(matches!(
        err,
        WiringError::VerificationFailed { namespace: Some(ref namespace), found: None, .. } if namespace == "x"
    ));
}

#[test]
fn body_can_satisfy_a_verification() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    Routine::new("body-provisions")
        .verify([ResourceKind::AddressReport])
        .run(&mut run.engine(), |engine| {
            engine.plain(ResourceKind::AddressReport)?;
            Ok(())
        })
        .unwrap();
}

#[test]
fn body_errors_skip_verification() {
    let harness = Harness::new();
    let mut run = harness.run("debug");

    let err = Routine::new("failing")
        .verify([ResourceKind::AddressReport])
        .run(&mut run.engine(), |_| -> Result<(), WiringError> {
            Err(WiringError::UnresolvedResource {
                key: "Faucet".into(),
            })
        })
        .unwrap_err();

    assert!(matches!(err, WiringError::UnresolvedResource { key } if key == "Faucet"));
}

/// Records its name when run.
struct Recorder {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl CompositeUnit for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, _engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        self.log.borrow_mut().push(self.name);
        Ok(None)
    }
}

#[test]
fn chain_runs_left_to_right() {
    let harness = Harness::new();
    let mut run = harness.run("debug");
    let log = Rc::new(RefCell::new(Vec::new()));
    let recorder = |name| {
        WiringRequest::bare(Recorder {
            name,
            log: Rc::clone(&log),
        })
    };

    Routine::new("chain")
        .inject(recorder("first"))
        .inject((recorder("second"), recorder("third")))
        .run(&mut run.engine(), |_| {
            log.borrow_mut().push("body");
            Ok(())
        })
        .unwrap();

    assert_eq!(*log.borrow(), ["first", "second", "third", "body"]);
}

#[test]
fn slices_and_vectors_are_requirement_sets() {
    let harness = Harness::new();
    let mut run = harness.run("debug");
    let kinds = vec![ResourceKind::ClaimVault, ResourceKind::FeeCollector];

    let resolved = wire_all(&mut run.engine(), &kinds).unwrap();
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].label, "ClaimVault");

    let again = wire_all(&mut run.engine(), &kinds.as_slice()).unwrap();
    assert_eq!(resolved, again);
    assert_eq!(harness.ledger.materializations(), 2);
}
