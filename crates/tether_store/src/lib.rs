//! Environment-scoped durable wiring store.
//!
//! An [`EnvironmentStore`] maps wiring keys to primitive values, one TOML
//! document per environment tag:
//!
//! ```text
//! deployments/
//! ├── debug.toml
//! └── production.toml
//! ```
//!
//! # Behavior
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`select`](EnvironmentStore::select) | Load `<root>/<tag>.toml` once, then serve from cache |
//! | [`get`](EnvironmentStore::get) | Read from the active record |
//! | [`set`](EnvironmentStore::set) | Update the active record, flush per [`WritePolicy`] |
//! | [`flush`](EnvironmentStore::flush) | Re-serialize every dirty record in full |
//!
//! Reading or writing before any environment is selected fails with
//! [`StoreError::NotSelected`].
//!
//! # Failure policy
//!
//! The store fails fast instead of guessing. A document that is not UTF-8 is
//! reported as [`StoreError::NotUtf8`], one that does not parse as
//! [`StoreError::Corrupted`]. An immediate write whose flush fails is undone in
//! the cache, so reads never see a value that is not on disk. A file that changed on disk since the
//! store last read or wrote it is reported as
//! [`StoreError::ConcurrentModification`] and left as is. The store is meant
//! for one writer in one process; these checks detect misuse, they do not make
//! concurrent writers safe.

mod config;
mod error;
mod record;
mod store;

pub use config::{StoreConfig, WritePolicy};
pub use error::StoreError;
pub use record::{EnvironmentRecord, EnvironmentTag, WiringValue};
pub use store::EnvironmentStore;
