//! Injection decorators.
//!
//! A decorator wraps a unit of work. Before the body runs, it wires every
//! resource it declares and logs one `resolved <kind[/namespace]> -> <location>`
//! line per resource. The body then runs with the engine, and through it the
//! [`Lookup`](crate::lookup::Lookup) facade.
//!
//! The verifying family additionally derives the expected location of each
//! declared `(kind, namespace?)` pair before the body runs, and checks after
//! it returns that a live resource sits at every one of them. A failed check
//! raises [`WiringError::VerificationFailed`]; nothing is rolled back.
//!
//! # Requirement sets
//!
//! Decorators accept any [`RequirementSet`]: a single requirement, a tuple of
//! 1 to 10 requirements of mixed types, an array, a slice or a `Vec`.
//!
//! ```no_run
//! use tether_system::catalog::ResourceKind;
//! use tether_wiring::inject::Routine;
//! use tether_wiring::request::WiringRequest;
//! # use tether_wiring::engine::WiringEngine;
//! # fn demo(engine: &mut WiringEngine<'_>) -> Result<(), tether_wiring::error::WiringError> {
//!
//! let usdc = WiringRequest::nicknamed(ResourceKind::FungibleToken, "usdc")?;
//! let faucet = Routine::new("faucet")
//!     .inject_verified((ResourceKind::FeeCollector, usdc))
//!     .inject([ResourceKind::ClaimVault, ResourceKind::AddressReport]);
//!
//! faucet.run(engine, |engine| {
//!     let fees = engine.lookup().resolve(ResourceKind::FeeCollector, None)?;
//!     assert!(!fees.is_zero());
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

mod verify;

use hashbrown::HashSet;
use tether_system::catalog::ResourceKind;
use tether_system::identity::Location;
use tether_system::key::WiringKey;
use variadics_please::all_tuples;

use crate::engine::WiringEngine;
use crate::error::WiringError;
use crate::request::{CompositeRequest, WiringRequest};

pub use verify::Expectation;

// ─────────────────────────────────────────────────────────────────────────────
// Requirements
// ─────────────────────────────────────────────────────────────────────────────

/// One declared resource.
pub trait Requirement {
    /// Diagnostic label, `kind` or `kind/namespace`.
    fn label(&self) -> String;

    /// Wires the resource.
    ///
    /// # Errors
    ///
    /// Returns whatever the engine raises.
    fn wire(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError>;

    /// The post-condition a verifying decorator checks for this requirement.
    ///
    /// `None` for requirements with no single outward-facing resource.
    fn expectation(&self) -> Option<Expectation>;
}

impl Requirement for ResourceKind {
    fn label(&self) -> String {
        self.name().to_string()
    }

    fn wire(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        engine.plain(*self).map(Some)
    }

    fn expectation(&self) -> Option<Expectation> {
        Some(Expectation::plain(*self))
    }
}

impl Requirement for WiringKey {
    fn label(&self) -> String {
        WiringKey::label(self)
    }

    fn wire(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        match self.namespace() {
            None => engine.plain(self.kind()).map(Some),
            Some(namespace) => engine.nicknamed(self.kind(), namespace).map(Some),
        }
    }

    fn expectation(&self) -> Option<Expectation> {
        Some(Expectation::for_key(self.clone()))
    }
}

impl Requirement for WiringRequest {
    fn label(&self) -> String {
        WiringRequest::label(self)
    }

    fn wire(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        engine.wire(self)
    }

    fn expectation(&self) -> Option<Expectation> {
        match self {
            Self::Composite(CompositeRequest::Bare(_)) => None,
            other => other.key().map(Expectation::for_key),
        }
    }
}

impl<R: Requirement + ?Sized> Requirement for &R {
    fn label(&self) -> String {
        (**self).label()
    }

    fn wire(&self, engine: &mut WiringEngine<'_>) -> Result<Option<Location>, WiringError> {
        (**self).wire(engine)
    }

    fn expectation(&self) -> Option<Expectation> {
        (**self).expectation()
    }
}

/// A requirement after it was wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Diagnostic label.
    pub label: String,
    /// Location produced, `None` for bare composites.
    pub location: Option<Location>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Requirement sets
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed or dynamic collection of requirements.
pub trait RequirementSet {
    /// The requirements, in declared order.
    fn requirements(&self) -> Vec<&dyn Requirement>;
}

macro_rules! impl_single_requirement_set {
    ($($ty:ty),*) => {
        $(
            impl RequirementSet for $ty {
                fn requirements(&self) -> Vec<&dyn Requirement> {
                    vec![self as &dyn Requirement]
                }
            }
        )*
    };
}

impl_single_requirement_set!(ResourceKind, WiringKey, WiringRequest);

macro_rules! impl_requirement_set_tuple {
    ($(($req:ident, $binding:ident)),*) => {
        impl<$($req: Requirement),*> RequirementSet for ($($req,)*) {
            fn requirements(&self) -> Vec<&dyn Requirement> {
                let ($($binding,)*) = self;
                vec![$($binding as &dyn Requirement),*]
            }
        }
    };
}

// Tuples of 1 to 10 requirements
all_tuples!(impl_requirement_set_tuple, 1, 10, R, r);

impl<R: Requirement> RequirementSet for [R] {
    fn requirements(&self) -> Vec<&dyn Requirement> {
        self.iter().map(|req| req as &dyn Requirement).collect()
    }
}

impl<R: Requirement, const N: usize> RequirementSet for [R; N] {
    fn requirements(&self) -> Vec<&dyn Requirement> {
        self.as_slice().requirements()
    }
}

impl<R: Requirement> RequirementSet for Vec<R> {
    fn requirements(&self) -> Vec<&dyn Requirement> {
        self.as_slice().requirements()
    }
}

impl<S: RequirementSet + ?Sized> RequirementSet for &S {
    fn requirements(&self) -> Vec<&dyn Requirement> {
        (**self).requirements()
    }
}

/// Wires every requirement in `set`, in declared order.
///
/// # Errors
///
/// Stops at the first failing requirement; earlier ones stay wired.
pub fn wire_all(
    engine: &mut WiringEngine<'_>,
    set: &dyn RequirementSet,
) -> Result<Vec<Resolved>, WiringError> {
    set.requirements()
        .into_iter()
        .map(|requirement| -> Result<Resolved, WiringError> {
            let label = requirement.label();
            let location = requirement.wire(engine)?;
            match location {
                Some(location) => tracing::info!("resolved {label} -> {location}"),
                None => tracing::info!("resolved {label} -> composite"),
            }
            Ok(Resolved { label, location })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Routine
// ─────────────────────────────────────────────────────────────────────────────

enum Step<'r> {
    Inject(Box<dyn RequirementSet + 'r>),
    Verify(Vec<Expectation>),
}

/// An ordered chain of decorators around a body.
///
/// Steps run left to right before the body. Verification steps derive their
/// expected locations in that pass and check them after the body returns.
pub struct Routine<'r> {
    name: String,
    steps: Vec<Step<'r>>,
}

impl<'r> Routine<'r> {
    /// Creates an empty routine.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wires `requirements` before the body runs.
    #[must_use]
    pub fn inject(mut self, requirements: impl RequirementSet + 'r) -> Self {
        self.steps.push(Step::Inject(Box::new(requirements)));
        self
    }

    /// Wires `requirements` before the body runs and verifies each is live
    /// after it returns.
    #[must_use]
    pub fn inject_verified(self, requirements: impl RequirementSet + 'r) -> Self {
        let expectations: Vec<_> = requirements
            .requirements()
            .into_iter()
            .filter_map(|requirement| requirement.expectation())
            .collect();
        self.inject(requirements).verify(expectations)
    }

    /// Verifies each expectation is live after the body returns.
    ///
    /// Duplicate pairs are checked once.
    #[must_use]
    pub fn verify<E: Into<Expectation>>(mut self, expectations: impl IntoIterator<Item = E>) -> Self {
        let mut seen = HashSet::new();
        let expectations = expectations
            .into_iter()
            .map(Into::into)
            .filter(|expectation: &Expectation| seen.insert(expectation.clone()))
            .collect();
        self.steps.push(Step::Verify(expectations));
        self
    }

    /// Runs the chain around `body`.
    ///
    /// # Errors
    ///
    /// Returns the first wiring error, the body's error, or the first failed
    /// verification. Completed steps are never undone.
    pub fn run<T>(
        &self,
        engine: &mut WiringEngine<'_>,
        body: impl FnOnce(&mut WiringEngine<'_>) -> Result<T, WiringError>,
    ) -> Result<T, WiringError> {
        let _span = tracing::info_span!("routine", name = %self.name).entered();

        let mut armed = Vec::new();
        for step in &self.steps {
            match step {
                Step::Inject(set) => {
                    wire_all(engine, set.as_ref())?;
                }
                Step::Verify(expectations) => {
                    armed.extend(expectations.iter().map(Expectation::arm));
                }
            }
        }

        let output = body(&mut *engine)?;

        for check in &armed {
            check.check(engine)?;
        }
        Ok(output)
    }
}

/// Wires `requirements`, then runs `body`.
///
/// # Errors
///
/// See [`Routine::run`].
pub fn inject<T>(
    engine: &mut WiringEngine<'_>,
    requirements: impl RequirementSet,
    body: impl FnOnce(&mut WiringEngine<'_>) -> Result<T, WiringError>,
) -> Result<T, WiringError> {
    Routine::new("inject").inject(requirements).run(engine, body)
}

/// Wires `requirements`, runs `body`, then verifies every requirement is live.
///
/// # Errors
///
/// See [`Routine::run`].
pub fn inject_verified<T>(
    engine: &mut WiringEngine<'_>,
    requirements: impl RequirementSet,
    body: impl FnOnce(&mut WiringEngine<'_>) -> Result<T, WiringError>,
) -> Result<T, WiringError> {
    Routine::new("inject_verified")
        .inject_verified(requirements)
        .run(engine, body)
}
