//! Ambient infrastructure for Tether binaries.
//!
//! - [`Settings`]: environment tag, store location, write policy and logging,
//!   from defaults, a TOML file and `TETHER_*` variables
//! - [`TracingSetup`]: installs the global `tracing` subscriber

pub mod settings;
pub mod tracing_setup;

pub use settings::{CONFIG_VARIABLE, Settings, SettingsError};
pub use tracing_setup::{TracingFormat, TracingSetup};
