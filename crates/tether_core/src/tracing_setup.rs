//! Tracing subscriber setup.
//!
//! [`TracingSetup`] installs a `tracing_subscriber` registry with an
//! [`EnvFilter`] and one formatting layer. Installation is idempotent: if a
//! global subscriber already exists, [`init`](TracingSetup::init) leaves it in
//! place and returns `false`.
//!
//! # Example
//!
//! ```
//! use tether_core::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! // Development: pretty output with span enter/exit
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty)
//!     .with_span_events(true)
//!     .init();
//!
//! // Production: JSON with per-target levels
//! let production = TracingSetup::new()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("tether_wiring=info,tether_store=warn");
//! # let _ = production;
//! ```

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::settings::Settings;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    /// Multi-line, colored, for terminals.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON objects.
    Json,
}

/// Builder for the global tracing subscriber.
#[derive(Debug, Clone)]
pub struct TracingSetup {
    level: Level,
    format: TracingFormat,
    /// Directive string such as `"tether_wiring=debug,tether_store=warn"`.
    directives: Option<String>,
    trace_spans: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            directives: None,
            trace_spans: false,
        }
    }
}

impl TracingSetup {
    /// Creates a setup with `INFO` level and pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a setup from the logging part of `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let setup = Self::new().with_format(settings.log_format);
        match &settings.log {
            Some(filter) => setup.with_env_filter(filter.clone()),
            None => setup,
        }
    }

    /// Sets the maximum log level used when no filter is given.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Chooses how lines are rendered.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a filter directive string, `target=level,target=level,...`.
    ///
    /// An invalid directive falls back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.directives = Some(filter.into());
        self
    }

    /// Also logs when a span such as `routine` is entered and exited.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.trace_spans = enabled;
        self
    }

    /// The configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    fn filter(&self) -> EnvFilter {
        match &self.directives {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` if a subscriber was already installed.
    pub fn init(&self) -> bool {
        let span_events = match self.trace_spans {
            true => FmtSpan::ENTER | FmtSpan::EXIT,
            false => FmtSpan::NONE,
        };

        let registry = tracing_subscriber::registry().with(self.filter());
        let installed = match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        }
        .is_ok();

        if installed {
            tracing::debug!(level = %self.level, format = ?self.format, "tracing initialized");
        }
        installed
    }
}
