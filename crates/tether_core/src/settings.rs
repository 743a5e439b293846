//! Runtime settings.
//!
//! Settings come from three places, in increasing precedence:
//!
//! 1. built-in defaults
//! 2. the TOML file named by `TETHER_CONFIG`, if set
//! 3. `TETHER_*` environment variables
//!
//! [`Settings::from_env`] applies all three against the process environment;
//! [`Settings::load_with`] does the same against any variable source.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `TETHER_ENVIRONMENT` | `environment` | `debug` |
//! | `TETHER_STORE_DIR` | `store_dir` | `deployments` |
//! | `TETHER_WRITE_POLICY` | `write_policy` | `immediate` |
//! | `TETHER_LEDGER` | `ledger` | none |
//! | `TETHER_LOG` | `log` | none (`info`) |
//! | `TETHER_LOG_FORMAT` | `log_format` | `pretty` |
//! | `TETHER_CONFIG` | settings file | none |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tether_store::{StoreConfig, WritePolicy};

use crate::tracing_setup::TracingFormat;

/// Variable naming the TOML settings file.
pub const CONFIG_VARIABLE: &str = "TETHER_CONFIG";

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("cannot read settings file {}: {source}", path.display())]
    Read {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML document does not match the settings shape.
    #[error("invalid settings document: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {variable}: expected one of {expected}")]
    InvalidVariable {
        /// The variable name.
        variable: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
}

/// Everything a deployment run needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Environment tag to select.
    pub environment: String,
    /// Directory holding environment documents.
    pub store_dir: PathBuf,
    /// Store flush behavior.
    pub write_policy: WritePolicy,
    /// Optional ledger snapshot file.
    pub ledger: Option<PathBuf>,
    /// Tracing filter directives.
    pub log: Option<String>,
    /// Tracing output format.
    pub log_format: TracingFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "debug".to_string(),
            store_dir: PathBuf::from("deployments"),
            write_policy: WritePolicy::Immediate,
            ledger: None,
            log: None,
            log_format: TracingFormat::Pretty,
        }
    }
}

impl Settings {
    /// Parses a TOML settings document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed TOML or unknown fields.
    ///
    /// # Example
    ///
    /// ```
    /// use tether_core::Settings;
    ///
    /// let settings = Settings::from_toml_str(r#"
    ///     environment = "production"
    ///     write_policy = "deferred"
    /// "#).unwrap();
    /// assert_eq!(settings.environment, "production");
    /// assert_eq!(settings.store_dir, std::path::Path::new("deployments"));
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] if the file cannot be read, or
    /// [`SettingsError::Parse`] if its contents are not valid settings.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`load_with`](Self::load_with).
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Loads defaults, then the file named by [`CONFIG_VARIABLE`], then the
    /// remaining `TETHER_*` variables, each overriding the one before.
    ///
    /// # Errors
    ///
    /// Returns any error from [`from_file`](Self::from_file) or
    /// [`overlay`](Self::overlay).
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let base = match lookup(CONFIG_VARIABLE) {
            Some(path) => {
                tracing::debug!(%path, "reading settings file");
                Self::from_file(Path::new(&path))?
            }
            None => Self::default(),
        };
        base.overlay(lookup)
    }

    /// Overrides fields from a variable source such as the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidVariable`] for unusable values.
    pub fn overlay(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        if let Some(environment) = lookup("TETHER_ENVIRONMENT") {
            self.environment = environment;
        }
        if let Some(dir) = lookup("TETHER_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(policy) = lookup("TETHER_WRITE_POLICY") {
            self.write_policy = match policy.to_ascii_lowercase().as_str() {
                "immediate" => WritePolicy::Immediate,
                "deferred" => WritePolicy::Deferred,
                _ => {
                    return Err(SettingsError::InvalidVariable {
                        variable: "TETHER_WRITE_POLICY",
                        value: policy,
                        expected: "immediate, deferred",
                    });
                }
            };
        }
        if let Some(ledger) = lookup("TETHER_LEDGER") {
            self.ledger = Some(PathBuf::from(ledger));
        }
        if let Some(log) = lookup("TETHER_LOG") {
            self.log = Some(log);
        }
        if let Some(format) = lookup("TETHER_LOG_FORMAT") {
            self.log_format = match format.to_ascii_lowercase().as_str() {
                "pretty" => TracingFormat::Pretty,
                "compact" => TracingFormat::Compact,
                "json" => TracingFormat::Json,
                _ => {
                    return Err(SettingsError::InvalidVariable {
                        variable: "TETHER_LOG_FORMAT",
                        value: format,
                        expected: "pretty, compact, json",
                    });
                }
            };
        }
        Ok(self)
    }

    /// Sets the environment tag.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the store directory.
    #[must_use]
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    /// Sets the write policy.
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Sets the ledger snapshot file.
    #[must_use]
    pub fn with_ledger(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger = Some(path.into());
        self
    }

    /// Sets the tracing filter directives.
    #[must_use]
    pub fn with_log(mut self, filter: impl Into<String>) -> Self {
        self.log = Some(filter.into());
        self
    }

    /// Sets the tracing output format.
    #[must_use]
    pub fn with_log_format(mut self, format: TracingFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Store configuration derived from these settings.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.store_dir).with_write_policy(self.write_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.environment, "debug");
        assert_eq!(settings.store_dir, PathBuf::from("deployments"));
        assert_eq!(settings.write_policy, WritePolicy::Immediate);
        assert_eq!(settings.log_format, TracingFormat::Pretty);
        assert!(settings.ledger.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let settings = Settings::default()
            .overlay(vars(&[
                ("TETHER_ENVIRONMENT", "staging"),
                ("TETHER_STORE_DIR", "/var/lib/tether"),
                ("TETHER_WRITE_POLICY", "Deferred"),
                ("TETHER_LOG", "tether_wiring=debug"),
                ("TETHER_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(settings.environment, "staging");
        assert_eq!(settings.store_dir, PathBuf::from("/var/lib/tether"));
        assert_eq!(settings.write_policy, WritePolicy::Deferred);
        assert_eq!(settings.log.as_deref(), Some("tether_wiring=debug"));
        assert_eq!(settings.log_format, TracingFormat::Json);
    }

    #[test]
    fn bad_variable_is_rejected() {
        let err = Settings::default()
            .overlay(vars(&[("TETHER_LOG_FORMAT", "xml")]))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidVariable { variable: "TETHER_LOG_FORMAT", .. }
        ));
    }

    #[test]
    fn toml_document() {
        let settings = Settings::from_toml_str(
            r#"
            environment = "production"
            store_dir = "state"
            write_policy = "deferred"
            ledger = "state/ledger.json"
            log_format = "compact"
            "#,
        )
        .unwrap();
        assert_eq!(settings.environment, "production");
        assert_eq!(settings.ledger, Some(PathBuf::from("state/ledger.json")));
        assert_eq!(settings.log_format, TracingFormat::Compact);
        assert_eq!(
            settings.store_config().file_for("production"),
            PathBuf::from("state/production.toml")
        );
    }

    #[test]
    fn variables_override_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tether.toml");
        std::fs::write(
            &file,
            "environment = \"production\"\nstore_dir = \"state\"\nlog_format = \"compact\"\n",
        )
        .unwrap();
        let path = file.to_str().unwrap();

        let from_file = Settings::load_with(vars(&[(CONFIG_VARIABLE, path)])).unwrap();
        assert_eq!(from_file.environment, "production");
        assert_eq!(from_file.store_dir, PathBuf::from("state"));
        assert_eq!(from_file.write_policy, WritePolicy::Immediate);

        let layered = Settings::load_with(vars(&[
            (CONFIG_VARIABLE, path),
            ("TETHER_ENVIRONMENT", "staging"),
            ("TETHER_WRITE_POLICY", "deferred"),
        ]))
        .unwrap();
        assert_eq!(layered.environment, "staging");
        assert_eq!(layered.store_dir, PathBuf::from("state"));
        assert_eq!(layered.write_policy, WritePolicy::Deferred);
        assert_eq!(layered.log_format, TracingFormat::Compact);
    }

    #[test]
    fn missing_settings_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let err = Settings::load_with(vars(&[(CONFIG_VARIABLE, absent.to_str().unwrap())]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Read { path, .. } if path == absent));
    }

    #[test]
    fn no_settings_file_means_defaults() {
        assert_eq!(Settings::load_with(vars(&[])).unwrap(), Settings::default());
    }

    #[test]
    fn unknown_toml_field_is_rejected() {
        assert!(matches!(
            Settings::from_toml_str("enviroment = \"typo\""),
            Err(SettingsError::Parse(_))
        ));
    }
}
