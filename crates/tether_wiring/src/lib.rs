//! Deterministic resource wiring.
//!
//! This crate decides, for each resource a deployment routine needs, whether
//! it already exists at its derived location, provisions it if not, records
//! where it lives in the active environment and serves typed lookups.
//!
//! # Flow
//!
//! ```text
//! Routine ──▶ WiringEngine ──▶ derive(kind, ns?) ──▶ store.get(key)
//!    │              │                                    │ absent
//!    │              │                                    ▼
//!    │              │                         ledger.materialize ─▶ store.set
//!    ▼              ▼
//!  body ──────▶ Lookup::resolve
//!    │
//!    ▼
//! verify: ledger.is_live(expected)
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Strategy dispatch: plain, nicknamed, composite |
//! | [`composite`] | The [`CompositeUnit`](composite::CompositeUnit) trait and built-in wrap units |
//! | [`inject`] | Injection and verifying decorators, [`Routine`](inject::Routine) |
//! | [`lookup`] | The read-only [`Lookup`](lookup::Lookup) facade |
//! | [`request`] | Typed requests, binary codec and JSON plans |
//! | [`suites`] | Ready-made composite units |
//! | [`deployment`] | The [`Deployment`](deployment::Deployment) handle |

pub mod composite;
pub mod deployment;
pub mod engine;
pub mod error;
pub mod inject;
pub mod lookup;
pub mod request;
pub mod suites;

/// Common imports for wiring code.
pub mod prelude {
    pub use crate::composite::{CompositeUnit, NamedInstanceUnit, WrapUnit};
    pub use crate::deployment::Deployment;
    pub use crate::engine::{Provisioned, Provisioning, WiringEngine};
    pub use crate::error::WiringError;
    pub use crate::inject::{
        Expectation, Requirement, RequirementSet, Resolved, Routine, inject, inject_verified,
        wire_all,
    };
    pub use crate::lookup::Lookup;
    pub use crate::request::{CompositePayload, CompositeRequest, PlanStep, WiringPlan, WiringRequest};
    pub use crate::suites::{RecoverySuite, TokenSuite};
}
