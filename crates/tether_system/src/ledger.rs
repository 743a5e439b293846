//! The ledger collaborator.
//!
//! A [`Ledger`] is the execution environment resources are materialized
//! into. Tether never interprets what a resource does; it only needs these
//! capabilities:
//!
//! - [`materialize`](Ledger::materialize) - run a construction payload at a
//!   location, with the resource's own constructor arguments
//! - [`initialize`](Ledger::initialize) - invoke a post-construction
//!   initializer
//! - [`is_live`](Ledger::is_live) - check whether a resource exists at a
//!   location
//! - [`is_initialized`](Ledger::is_initialized) - check whether its
//!   initializer has run
//!
//! [`MemoryLedger`] is a reference implementation backed by an in-process map.
//! Clones share state, so a test can hand one clone to a deployment and keep
//! another to inspect what happened.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::{ConstructionPayload, ResourceKind};
use crate::identity::Location;

/// Errors reported by a ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Something is already live at the target location.
    #[error("location {0} is already occupied")]
    Occupied(Location),

    /// Nothing is live at the target location.
    #[error("nothing is live at {0}")]
    NotLive(Location),

    /// The resource at the location has already been initialized.
    #[error("resource at {0} is already initialized")]
    AlreadyInitialized(Location),

    /// The ledger refused the operation.
    #[error("ledger rejected operation: {0}")]
    Rejected(String),

    /// A ledger snapshot could not be read or written.
    #[error("ledger snapshot {path}: {message}")]
    Snapshot {
        /// Snapshot path.
        path: String,
        /// What went wrong.
        message: String,
    },
}

/// Execution environment that resources are materialized into.
pub trait Ledger: Send + Sync {
    /// Materializes `payload` at `location`, passing `args` to its constructor.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Occupied`] if something already lives there, or
    /// any backend-specific failure.
    fn materialize(
        &mut self,
        location: Location,
        kind: ResourceKind,
        payload: &ConstructionPayload,
        args: &[u8],
    ) -> Result<(), LedgerError>;

    /// Invokes the post-construction initializer `entrypoint` at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotLive`] if nothing lives there, or
    /// [`LedgerError::AlreadyInitialized`] on a second call.
    fn initialize(
        &mut self,
        location: Location,
        entrypoint: &str,
        args: &[u8],
    ) -> Result<(), LedgerError>;

    /// Returns `true` if a resource is live at `location`.
    fn is_live(&self, location: &Location) -> bool;

    /// Returns `true` if the resource at `location` has been initialized.
    fn is_initialized(&self, location: &Location) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryLedger
// ─────────────────────────────────────────────────────────────────────────────

/// A resource living in a [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveResource {
    /// Name of the kind that was materialized.
    pub kind: String,
    /// Hex SHA-256 of the creation code.
    pub code_hash: String,
    /// Hex constructor arguments.
    pub args: String,
    /// Initializer call, if one happened: `(entrypoint, hex args)`.
    pub initialized: Option<(String, String)>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct LedgerState {
    resources: BTreeMap<Location, LiveResource>,
    #[serde(default)]
    materializations: u64,
    #[serde(skip)]
    fail_next: Option<String>,
}

/// In-process [`Ledger`] with shared, cloneable state.
///
/// # Example
///
/// ```
/// use tether_system::catalog::ResourceKind;
/// use tether_system::identity::derive;
/// use tether_system::ledger::{Ledger, MemoryLedger};
///
/// let mut ledger = MemoryLedger::new();
/// let observer = ledger.clone();
///
/// let kind = ResourceKind::FeeCollector;
/// let location = derive(kind, None);
/// ledger.materialize(location, kind, kind.construction_payload(), &[]).unwrap();
///
/// assert!(observer.is_live(&location));
/// assert_eq!(observer.materializations(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a ledger snapshot written by [`save`](Self::save).
    ///
    /// A missing file yields an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Snapshot`] if the file exists but cannot be
    /// read or parsed.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let snapshot_error = |message: String| LedgerError::Snapshot {
            path: path.display().to_string(),
            message,
        };
        let state = match std::fs::read_to_string(path) {
            Ok(text) => {
                serde_json::from_str::<LedgerState>(&text).map_err(|e| snapshot_error(e.to_string()))?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(err) => return Err(snapshot_error(err.to_string())),
        };
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Writes a JSON snapshot of the ledger to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Snapshot`] on I/O or serialization failure.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let snapshot_error = |message: String| LedgerError::Snapshot {
            path: path.display().to_string(),
            message,
        };
        let text = serde_json::to_string_pretty(&*self.state.read())
            .map_err(|e| snapshot_error(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| snapshot_error(e.to_string()))
    }

    /// Number of successful materializations since creation.
    #[must_use]
    pub fn materializations(&self) -> u64 {
        self.state.read().materializations
    }

    /// Returns the resource live at `location`, if any.
    #[must_use]
    pub fn resource(&self, location: &Location) -> Option<LiveResource> {
        self.state.read().resources.get(location).cloned()
    }

    /// Number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().resources.len()
    }

    /// Returns `true` if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().resources.is_empty()
    }

    /// Makes the next materialization fail with [`LedgerError::Rejected`].
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.write().fail_next = Some(message.into());
    }
}

impl Ledger for MemoryLedger {
    fn materialize(
        &mut self,
        location: Location,
        kind: ResourceKind,
        payload: &ConstructionPayload,
        args: &[u8],
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        if let Some(message) = state.fail_next.take() {
            return Err(LedgerError::Rejected(message));
        }
        if state.resources.contains_key(&location) {
            return Err(LedgerError::Occupied(location));
        }
        state.resources.insert(
            location,
            LiveResource {
                kind: kind.name().to_string(),
                code_hash: hex::encode(Sha256::digest(payload.code)),
                args: hex::encode(args),
                initialized: None,
            },
        );
        state.materializations += 1;
        tracing::trace!(%location, kind = kind.name(), "materialized in memory");
        Ok(())
    }

    fn initialize(
        &mut self,
        location: Location,
        entrypoint: &str,
        args: &[u8],
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let resource = state
            .resources
            .get_mut(&location)
            .ok_or(LedgerError::NotLive(location))?;
        if resource.initialized.is_some() {
            return Err(LedgerError::AlreadyInitialized(location));
        }
        resource.initialized = Some((entrypoint.to_string(), hex::encode(args)));
        Ok(())
    }

    fn is_live(&self, location: &Location) -> bool {
        self.state.read().resources.contains_key(location)
    }

    fn is_initialized(&self, location: &Location) -> bool {
        self.state
            .read()
            .resources
            .get(location)
            .is_some_and(|resource| resource.initialized.is_some())
    }
}
