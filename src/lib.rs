//! Deterministic resource wiring for deployment routines.
//!
//! Tether decides for each resource a routine needs whether it already exists
//! at its derived location, provisions it if not, records where it lives in
//! the active environment and serves typed lookups.
//!
//! ```no_run
//! use tether::prelude::*;
//!
//! # fn main() -> Result<(), WiringError> {
//! let mut deployment = Deployment::open(StoreConfig::new("deployments"), "debug", MemoryLedger::new())?;
//! Routine::new("faucet")
//!     .inject_verified((ResourceKind::FeeCollector, ResourceKind::Faucet))
//!     .run(&mut deployment.engine(), |engine| {
//!         let faucet = engine.lookup().resolve(ResourceKind::Faucet, None)?;
//!         assert!(!faucet.is_zero());
//!         Ok(())
//!     })?;
//! # Ok(())
//! # }
//! ```

pub use tether_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_internal::prelude::*;
}
