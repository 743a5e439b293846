//! Error types for the environment store.

use std::path::PathBuf;

/// Errors raised by the environment store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key was requested before any environment was selected.
    #[error("no environment selected; call select() before reading or writing wiring")]
    NotSelected,

    /// The environment tag cannot be used as a file name.
    #[error("invalid environment tag {0:?}: use 1-32 characters from [A-Za-z0-9_-]")]
    InvalidTag(String),

    /// Reading or writing the backing file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a valid environment document.
    #[error("environment file {} is corrupted: {source}", path.display())]
    Corrupted {
        /// The file involved.
        path: PathBuf,
        /// The parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The backing file is not valid UTF-8.
    #[error("environment file {} is corrupted: {source}", path.display())]
    NotUtf8 {
        /// The file involved.
        path: PathBuf,
        /// Where decoding stopped.
        #[source]
        source: core::str::Utf8Error,
    },

    /// The record could not be rendered as TOML.
    #[error("failed to serialize environment {tag}: {source}")]
    Serialize {
        /// The environment being written.
        tag: String,
        /// The serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// The backing file changed on disk since it was loaded or last written.
    #[error("environment file {} was modified by another writer; reload before writing", path.display())]
    ConcurrentModification {
        /// The file involved.
        path: PathBuf,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
