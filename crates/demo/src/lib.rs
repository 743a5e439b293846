//! A complete deployment run.
//!
//! [`load_settings`] layers the settings file and variables over the
//! defaults. [`run`] opens the configured environment over a ledger snapshot,
//! wires either a JSON plan or the bundled suites, and saves the ledger back.

use std::path::Path;

use tether_core::{Settings, SettingsError};
use tether_system::catalog::ResourceKind;
use tether_system::identity::{Namespace, NamespaceError};
use tether_system::key::WiringEntry;
use tether_system::ledger::{LedgerError, MemoryLedger};
use tether_wiring::prelude::*;

/// Errors surfaced by a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The plan file could not be read.
    #[error("cannot read plan {path}: {source}")]
    Plan {
        /// Plan path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Wiring failed.
    #[error(transparent)]
    Wiring(#[from] WiringError),

    /// The ledger snapshot could not be loaded or saved.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A bundled namespace is invalid.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Loads settings from `lookup`, usually the process environment.
///
/// # Errors
///
/// Returns [`DemoError::Settings`] if the settings file or a variable is
/// unusable.
pub fn load_settings(lookup: impl Fn(&str) -> Option<String>) -> Result<Settings, DemoError> {
    Ok(Settings::load_with(lookup)?)
}

/// Namespace of the token wired by the bundled run.
pub const DEMO_TOKEN: &str = "usdc";

/// The bundled routine: a token suite and the recovery suite, verified.
///
/// # Errors
///
/// Returns [`DemoError::Namespace`] if [`DEMO_TOKEN`] is not a valid
/// namespace.
pub fn bundled_routine() -> Result<Routine<'static>, DemoError> {
    let token = Namespace::new(DEMO_TOKEN)?;
    Ok(Routine::new("bundled")
        .inject((
            WiringRequest::bare(TokenSuite::new(token.clone())),
            WiringRequest::bare(RecoverySuite),
        ))
        .verify([
            Expectation::plain(ResourceKind::FeeCollector),
            Expectation::nicknamed(ResourceKind::FungibleToken, token.clone()),
            Expectation::nicknamed(ResourceKind::Faucet, token),
            Expectation::plain(ResourceKind::AddressReport),
            Expectation::nicknamed(
                ResourceKind::Proxy,
                Namespace::of_kind(ResourceKind::GuardianRecovery),
            ),
        ]))
}

/// Runs one deployment and returns the environment's wiring afterwards.
///
/// # Errors
///
/// Returns the first plan, wiring or ledger error.
pub fn run(settings: &Settings, plan: Option<&Path>) -> Result<Vec<WiringEntry>, DemoError> {
    let ledger = match &settings.ledger {
        Some(path) => MemoryLedger::open(path)?,
        None => MemoryLedger::new(),
    };
    let mut deployment = Deployment::open(settings.store_config(), &settings.environment, ledger)?;
    tracing::info!(
        environment = %settings.environment,
        store = %settings.store_dir.display(),
        "deployment opened"
    );

    match plan {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| DemoError::Plan {
                path: path.display().to_string(),
                source,
            })?;
            let plan = WiringPlan::from_json(&text)?;
            deployment.run_plan(&plan)?;
        }
        None => {
            bundled_routine()?.run(&mut deployment.engine(), |engine| {
                let faucet = engine
                    .lookup()
                    .resolve_named(ResourceKind::Faucet, DEMO_TOKEN)?;
                tracing::info!(%faucet, "faucet ready");
                Ok(())
            })?;
        }
    }

    deployment.flush()?;
    if let Some(path) = &settings.ledger {
        deployment.ledger().save(path)?;
    }

    let entries = deployment.lookup().entries()?;
    for entry in &entries {
        tracing::info!("wired {} -> {}", entry.key.label(), entry.location);
    }
    Ok(entries)
}
