//! Store configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// When record changes reach the backing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Flush after every `set` (default).
    #[default]
    Immediate,
    /// Keep changes in memory until [`EnvironmentStore::flush`](crate::EnvironmentStore::flush).
    Deferred,
}

/// Configuration for an [`EnvironmentStore`](crate::EnvironmentStore).
///
/// # Example
///
/// ```
/// use tether_store::{StoreConfig, WritePolicy};
///
/// let config = StoreConfig::new("deployments").with_write_policy(WritePolicy::Deferred);
/// assert_eq!(config.file_for("debug"), std::path::Path::new("deployments/debug.toml"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<tag>.toml` document per environment.
    pub root: PathBuf,
    /// Flush behavior.
    #[serde(default)]
    pub write_policy: WritePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("deployments")
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at `root` with immediate writes.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_policy: WritePolicy::Immediate,
        }
    }

    /// Sets the write policy.
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Path of the document backing environment `tag`.
    #[must_use]
    pub fn file_for(&self, tag: &str) -> PathBuf {
        self.root.join(format!("{tag}.toml"))
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
