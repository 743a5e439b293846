//! The wiring error taxonomy.

use tether_store::StoreError;
use tether_system::catalog::CatalogError;
use tether_system::identity::{Location, NamespaceError};
use tether_system::key::KeyError;
use tether_system::ledger::LedgerError;

/// Errors raised while wiring, verifying or looking up resources.
///
/// Every variant is returned synchronously and unmodified through decorators
/// and bodies. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// A store operation ran before any environment was selected.
    #[error("no environment selected; select one before wiring or looking up resources")]
    ConfigurationNotSelected,

    /// A kind name does not belong to the catalog.
    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),

    /// A lookup found no entry for the key.
    #[error("resource {key} has not been wired in this environment")]
    UnresolvedResource {
        /// The key that was requested, e.g. `Faucet_usdc`.
        key: String,
    },

    /// A request used a strategy or payload shape that cannot be decoded.
    #[error("unsupported wiring shape: {0}")]
    UnsupportedWiringShape(String),

    /// A verified resource is not live at its expected location.
    #[error(
        "verification failed for {kind}{}: expected a live resource at {expected}, store holds {}",
        namespace_suffix(.namespace.as_deref()),
        .found.as_deref().unwrap_or("nothing")
    )]
    VerificationFailed {
        /// Kind name.
        kind: String,
        /// Namespace, for nicknamed resources.
        namespace: Option<String>,
        /// Location derived before the body ran.
        expected: Location,
        /// What the store held for the key after the body ran.
        found: Option<String>,
    },

    /// A wrap step found nothing live at the inner resource's location.
    #[error("cannot wrap {kind}: nothing is live at {location}")]
    WrapTargetMissing {
        /// Kind name of the inner resource.
        kind: String,
        /// Where the inner resource was expected.
        location: Location,
    },

    /// A stored value is present but is not a location.
    #[error("entry {key} holds {value:?}, which is not a location")]
    MalformedEntry {
        /// The entry's key.
        key: String,
        /// The raw stored value.
        value: String,
    },

    /// A namespace failed validation.
    #[error(transparent)]
    InvalidNamespace(#[from] NamespaceError),

    /// The environment store failed.
    #[error(transparent)]
    Store(StoreError),

    /// The ledger refused or failed an operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

fn namespace_suffix(namespace: Option<&str>) -> String {
    namespace.map(|ns| format!("/{ns}")).unwrap_or_default()
}

impl From<StoreError> for WiringError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotSelected => Self::ConfigurationNotSelected,
            other => Self::Store(other),
        }
    }
}

impl From<CatalogError> for WiringError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownResourceKind(name) => Self::UnknownResourceKind(name),
        }
    }
}

impl From<KeyError> for WiringError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Catalog(err) => err.into(),
            KeyError::Namespace(err) => err.into(),
        }
    }
}
