//! The read-only lookup facade.
//!
//! Bodies use [`Lookup`] to find where resources were wired. A lookup never
//! provisions and never writes; an absent entry is an error, not an empty
//! location.

use tether_store::{EnvironmentStore, WiringValue};
use tether_system::catalog::ResourceKind;
use tether_system::identity::{Location, Namespace};
use tether_system::key::{WiringEntry, WiringKey};

use crate::error::WiringError;

/// Reads the stored location for a raw key.
///
/// Missing keys, empty strings and the zero location all count as absent.
pub(crate) fn stored_location(
    store: &EnvironmentStore,
    key: &str,
) -> Result<Option<Location>, WiringError> {
    let Some(value) = store.get(key)? else {
        return Ok(None);
    };
    if value.is_empty() {
        return Ok(None);
    }
    let location = parse_value(key, value)?;
    Ok((!location.is_zero()).then_some(location))
}

fn parse_value(key: &str, value: &WiringValue) -> Result<Location, WiringError> {
    value
        .as_text()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| WiringError::MalformedEntry {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Typed, read-only access to the active environment's wiring.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    store: &'a EnvironmentStore,
}

impl<'a> Lookup<'a> {
    /// Creates a facade over `store`.
    #[must_use]
    pub fn new(store: &'a EnvironmentStore) -> Self {
        Self { store }
    }

    /// Returns where `kind` (optionally under `namespace`) was wired.
    ///
    /// # Errors
    ///
    /// - [`WiringError::ConfigurationNotSelected`] if no environment is active
    /// - [`WiringError::UnresolvedResource`] naming the key if it is absent
    /// - [`WiringError::MalformedEntry`] if the value is not a location
    pub fn resolve(
        &self,
        kind: ResourceKind,
        namespace: Option<&Namespace>,
    ) -> Result<Location, WiringError> {
        self.resolve_key(&WiringKey::new(kind, namespace.cloned()))
    }

    /// Like [`resolve`](Self::resolve), taking the namespace as a string.
    ///
    /// # Errors
    ///
    /// Also returns [`WiringError::InvalidNamespace`].
    pub fn resolve_named(&self, kind: ResourceKind, namespace: &str) -> Result<Location, WiringError> {
        self.resolve(kind, Some(&Namespace::new(namespace)?))
    }

    /// Returns where `key` was wired.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_key(&self, key: &WiringKey) -> Result<Location, WiringError> {
        let raw = key.to_string();
        match stored_location(self.store, &raw)? {
            Some(location) => {
                tracing::info!("lookup {} -> {location}", key.label());
                Ok(location)
            }
            None => {
                tracing::info!("lookup {} -> unresolved", key.label());
                Err(WiringError::UnresolvedResource { key: raw })
            }
        }
    }

    /// Returns `true` if `key` resolves to a location.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::ConfigurationNotSelected`] or
    /// [`WiringError::MalformedEntry`].
    pub fn contains(&self, key: &WiringKey) -> Result<bool, WiringError> {
        Ok(stored_location(self.store, &key.to_string())?.is_some())
    }

    /// Every wiring entry in the active environment, in key order.
    ///
    /// Values under keys that do not parse as wiring keys, or that are not
    /// locations, are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::ConfigurationNotSelected`] if no environment is
    /// active.
    pub fn entries(&self) -> Result<Vec<WiringEntry>, WiringError> {
        let record = self.store.active()?;
        Ok(record
            .iter()
            .filter_map(|(raw, value)| {
                let key = WiringKey::parse(raw).ok()?;
                let location = parse_value(raw, value).ok()?;
                Some(WiringEntry { key, location })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_store::StoreConfig;
    use tether_system::identity::derive;

    fn store(dir: &tempfile::TempDir) -> EnvironmentStore {
        EnvironmentStore::open(StoreConfig::new(dir.path()), "debug").unwrap()
    }

    #[test]
    fn unresolved_names_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let err = Lookup::new(&store)
            .resolve_named(ResourceKind::Faucet, "usdc")
            .unwrap_err();
        assert!(matches!(err, WiringError::UnresolvedResource { key } if key == "Faucet_usdc"));
    }

    #[test]
    fn not_selected_is_reported() {
        let store = EnvironmentStore::new(StoreConfig::default());
        assert!(matches!(
            Lookup::new(&store).resolve(ResourceKind::Faucet, None),
            Err(WiringError::ConfigurationNotSelected)
        ));
    }

    #[test]
    fn empty_and_zero_values_are_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        store.set("Faucet", "").unwrap();
        store
            .set("Proxy", Location::from_bytes([0; 20]))
            .unwrap();

        let lookup = Lookup::new(&store);
        assert!(matches!(
            lookup.resolve(ResourceKind::Faucet, None),
            Err(WiringError::UnresolvedResource { .. })
        ));
        assert!(matches!(
            lookup.resolve(ResourceKind::Proxy, None),
            Err(WiringError::UnresolvedResource { .. })
        ));
    }

    #[test]
    fn non_location_value_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        store.set("Faucet", 42_i64).unwrap();
        assert!(matches!(
            Lookup::new(&store).resolve(ResourceKind::Faucet, None),
            Err(WiringError::MalformedEntry { key, value }) if key == "Faucet" && value == "42"
        ));
    }

    #[test]
    fn plain_and_nicknamed_do_not_satisfy_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        store
            .set("Faucet", derive(ResourceKind::Faucet, None))
            .unwrap();

        let lookup = Lookup::new(&store);
        assert!(lookup.resolve(ResourceKind::Faucet, None).is_ok());
        assert!(lookup.resolve_named(ResourceKind::Faucet, "usdc").is_err());
    }

    #[test]
    fn entries_skip_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let location = derive(ResourceKind::Faucet, None);
        store.set("Faucet", location).unwrap();
        store.set("deployed_block", 12_i64).unwrap();
        store.set("Bridge", location).unwrap();

        let entries = Lookup::new(&store).entries().unwrap();
        assert_eq!(
            entries,
            vec![WiringEntry {
                key: WiringKey::plain(ResourceKind::Faucet),
                location,
            }]
        );
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lookups_log_at_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        let faucet = derive(ResourceKind::Faucet, None);
        store.set("Faucet", faucet).unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let lookup = Lookup::new(&store);
            lookup.resolve(ResourceKind::Faucet, None).unwrap();
            lookup.resolve_named(ResourceKind::Faucet, "usdc").unwrap_err();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains(&format!("lookup Faucet -> {faucet}")), "{output}");
        assert!(output.contains("lookup Faucet/usdc -> unresolved"), "{output}");
    }
}
