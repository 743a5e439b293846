//! # Tether Internal Library
//!
//! Re-exports the core Tether crates for convenience.

/// Layer 1: catalog, identity derivation and the ledger interface.
pub use tether_system;

/// Layer 1: environment-scoped durable store.
pub use tether_store;

/// Layer 2: wiring engine, decorators and lookups.
pub use tether_wiring;

/// Settings and tracing setup.
pub use tether_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_core::{Settings, TracingFormat, TracingSetup};
    pub use tether_store::{EnvironmentStore, StoreConfig, StoreError, WiringValue, WritePolicy};
    pub use tether_system::prelude::*;
    pub use tether_wiring::prelude::*;
}
