//! The environment-scoped store.

use hashbrown::HashMap;

use crate::config::{StoreConfig, WritePolicy};
use crate::error::StoreError;
use crate::record::{EnvironmentRecord, EnvironmentTag, WiringValue};

/// Durable key/value store scoped to one active environment.
///
/// Each environment's record is loaded from disk the first time it is
/// selected and cached for the life of the store. Selecting a cached
/// environment again never touches the file.
///
/// # Example
///
/// ```no_run
/// use tether_store::{EnvironmentStore, StoreConfig};
///
/// # fn main() -> Result<(), tether_store::StoreError> {
/// let mut store = EnvironmentStore::open(StoreConfig::new("deployments"), "debug")?;
/// store.set("Faucet", "0x0000000000000000000000000000000000000001")?;
/// assert!(store.get("Faucet")?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EnvironmentStore {
    config: StoreConfig,
    records: HashMap<EnvironmentTag, EnvironmentRecord>,
    active: Option<EnvironmentTag>,
}

impl EnvironmentStore {
    /// Creates a store with no environment selected.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            active: None,
        }
    }

    /// Creates a store and selects `tag`.
    ///
    /// # Errors
    ///
    /// See [`select`](Self::select).
    pub fn open(config: StoreConfig, tag: &str) -> Result<Self, StoreError> {
        let mut store = Self::new(config);
        store.select(tag)?;
        Ok(store)
    }

    /// The store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Makes `tag` the active environment, loading its record on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTag`] for an unusable tag, and
    /// [`StoreError::Io`], [`StoreError::NotUtf8`] or [`StoreError::Corrupted`]
    /// if the backing file cannot be loaded. On error the previously active environment stays
    /// selected.
    pub fn select(&mut self, tag: &str) -> Result<&EnvironmentRecord, StoreError> {
        let tag = EnvironmentTag::new(tag)?;
        if !self.records.contains_key(&tag) {
            let path = self.config.file_for(tag.as_str());
            let record = EnvironmentRecord::load(tag.clone(), path)?;
            tracing::debug!(
                environment = %tag,
                entries = record.len(),
                path = %record.path().display(),
                "environment loaded"
            );
            self.records.insert(tag.clone(), record);
        } else {
            tracing::trace!(environment = %tag, "environment cache hit");
        }
        self.active = Some(tag);
        self.active()
    }

    /// The active environment's tag, if one is selected.
    #[must_use]
    pub fn active_tag(&self) -> Option<&EnvironmentTag> {
        self.active.as_ref()
    }

    /// The active environment's record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotSelected`] if no environment is selected.
    pub fn active(&self) -> Result<&EnvironmentRecord, StoreError> {
        self.active
            .as_ref()
            .and_then(|tag| self.records.get(tag))
            .ok_or(StoreError::NotSelected)
    }

    fn active_mut(&mut self) -> Result<&mut EnvironmentRecord, StoreError> {
        let tag = self.active.as_ref().ok_or(StoreError::NotSelected)?;
        self.records.get_mut(tag).ok_or(StoreError::NotSelected)
    }

    /// Returns `true` if `tag`'s record is already cached.
    #[must_use]
    pub fn is_loaded(&self, tag: &str) -> bool {
        self.records.keys().any(|loaded| loaded.as_str() == tag)
    }

    /// Reads `key` from the active environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotSelected`] if no environment is selected.
    pub fn get(&self, key: &str) -> Result<Option<&WiringValue>, StoreError> {
        Ok(self.active()?.get(key))
    }

    /// Writes `key` into the active environment.
    ///
    /// With [`WritePolicy::Immediate`] the full record is flushed before this
    /// returns; if that flush fails the cached record is restored to its state
    /// before the call. Writing a value equal to the stored one is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotSelected`] if no environment is selected, or
    /// any flush error.
    pub fn set(&mut self, key: &str, value: impl Into<WiringValue>) -> Result<(), StoreError> {
        let policy = self.config.write_policy;
        let record = self.active_mut()?;
        let value = value.into();
        let was_dirty = record.is_dirty();
        let previous = record.insert(key.to_string(), value.clone());
        if previous.as_ref() == Some(&value) {
            return Ok(());
        }
        tracing::debug!(environment = %record.tag(), key, %value, "wiring entry set");
        if policy == WritePolicy::Immediate {
            if let Err(err) = record.flush() {
                record.revert(key, previous, was_dirty);
                tracing::warn!(environment = %record.tag(), key, error = %err, "write rolled back");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Flushes every dirty cached record.
    ///
    /// # Errors
    ///
    /// Returns the first flush error; records after it stay dirty.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let mut dirty: Vec<_> = self
            .records
            .values_mut()
            .filter(|record| record.is_dirty())
            .collect();
        dirty.sort_by(|a, b| a.tag().cmp(b.tag()));
        for record in dirty {
            record.flush()?;
        }
        Ok(())
    }
}
