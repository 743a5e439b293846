//! Deployment wiring CLI.
//!
//! Wires the bundled suites, or a JSON plan, into the environment selected by
//! `TETHER_ENVIRONMENT`, or by the settings file named in `TETHER_CONFIG`.
//!
//! # Usage
//!
//! ```bash
//! wire [plan.json]
//! ```
//!
//! # Example
//!
//! ```bash
//! TETHER_ENVIRONMENT=staging TETHER_LEDGER=ledger.json wire plans/airdrop.json
//! ```

use std::path::PathBuf;

use tether_core::TracingSetup;

fn main() {
    let settings = demo::load_settings(|name| std::env::var(name).ok()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    TracingSetup::from_settings(&settings).init();

    let plan = std::env::args().nth(1).map(PathBuf::from);

    match demo::run(&settings, plan.as_deref()) {
        Ok(entries) => tracing::info!(count = entries.len(), "wiring complete"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
