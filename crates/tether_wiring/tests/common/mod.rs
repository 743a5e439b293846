//! Shared fixture for wiring integration tests.

use std::path::PathBuf;

use tether_store::StoreConfig;
use tether_system::identity::Namespace;
use tether_system::ledger::MemoryLedger;
use tether_wiring::deployment::Deployment;

/// A temporary store directory plus a ledger that outlives individual runs.
///
/// Each call to [`run`](Self::run) opens a fresh store over the same
/// directory, which is what a new process would see.
pub struct Harness {
    dir: tempfile::TempDir,
    pub ledger: MemoryLedger,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            ledger: MemoryLedger::new(),
        }
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::new(self.dir.path())
    }

    pub fn run(&self, environment: &str) -> Deployment<MemoryLedger> {
        Deployment::open(self.config(), environment, self.ledger.clone()).unwrap()
    }

    pub fn file(&self, environment: &str) -> PathBuf {
        self.dir.path().join(format!("{environment}.toml"))
    }

    pub fn contents(&self, environment: &str) -> String {
        std::fs::read_to_string(self.file(environment)).unwrap_or_default()
    }
}

pub fn ns(value: &str) -> Namespace {
    Namespace::new(value).unwrap()
}
