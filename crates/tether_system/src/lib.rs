//! The foundational layer of Tether (Layer 1).
//!
//! `tether_system` holds everything that is pure or collaborator-facing:
//!
//! - [`catalog`] - The closed set of resource kinds and their payloads
//! - [`identity`] - Deterministic `(kind, namespace?) -> location` derivation
//! - [`key`] - The `"<Kind>"` / `"<Kind>_<Namespace>"` wiring key convention
//! - [`ledger`] - The collaborator resources are materialized into
//!
//! # Architecture
//!
//! - **Layer 1** (`tether_system`, `tether_store`): identity and persistence (this crate)
//! - **Layer 2** (`tether_wiring`): strategies, injection and lookup
//! - **Infrastructure** (`tether_core`): settings and tracing
//!
//! # Example
//!
//! ```
//! use tether_system::prelude::*;
//!
//! let key = WiringKey::parse("Faucet_usdc").unwrap();
//! assert_eq!(key.kind(), ResourceKind::Faucet);
//! assert_eq!(key.derive(), derive(ResourceKind::Faucet, key.namespace()));
//! ```

/// The closed resource catalog.
pub mod catalog;

/// Deterministic identity derivation.
pub mod identity;

/// Wiring keys and entries.
pub mod key;

/// The ledger collaborator interface.
pub mod ledger;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::identity::*;
    pub use crate::key::*;
    pub use crate::ledger::*;
}
