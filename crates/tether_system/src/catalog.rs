//! The closed catalog of provisionable resource kinds.
//!
//! Every kind Tether knows how to provision is a variant of [`ResourceKind`].
//! Each variant maps to exactly one stable name and exactly one
//! [`ConstructionPayload`]; both tables are exhaustive `match` expressions, so
//! adding a variant without filling in its entries fails to compile.
//!
//! | Kind | Name | Initializer |
//! |------|------|-------------|
//! | [`FungibleToken`](ResourceKind::FungibleToken) | `FungibleToken` | `initialize` |
//! | [`CollectibleToken`](ResourceKind::CollectibleToken) | `CollectibleToken` | `initialize` |
//! | [`ClaimVault`](ResourceKind::ClaimVault) | `ClaimVault` | - |
//! | [`Faucet`](ResourceKind::Faucet) | `Faucet` | `configure` |
//! | [`FeeCollector`](ResourceKind::FeeCollector) | `FeeCollector` | - |
//! | [`GuardianRecovery`](ResourceKind::GuardianRecovery) | `GuardianRecovery` | `setup` |
//! | [`AddressReport`](ResourceKind::AddressReport) | `AddressReport` | - |
//! | [`Proxy`](ResourceKind::Proxy) | `Proxy` | `upgrade_to` |
//!
//! # Example
//!
//! ```
//! use tether_system::catalog::ResourceKind;
//!
//! let kind: ResourceKind = "Faucet".parse().unwrap();
//! assert_eq!(kind, ResourceKind::Faucet);
//! assert_eq!(kind.name(), "Faucet");
//! assert!(!kind.construction_payload().code.is_empty());
//! ```

use core::fmt;
use core::str::FromStr;

/// Errors raised when a value falls outside the closed catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The name does not belong to any catalog entry.
    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),
}

/// A class of provisionable component.
///
/// The set is closed and defined at compile time. See the module docs for the
/// full table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Fungible token template.
    FungibleToken,
    /// Non-fungible (collectible) token template.
    CollectibleToken,
    /// Claim contract holding allocations until claimed.
    ClaimVault,
    /// Faucet dispensing a wired token.
    Faucet,
    /// Fee collector receiving protocol fees.
    FeeCollector,
    /// Guardian-based recovery state machine.
    GuardianRecovery,
    /// Registry of reported addresses.
    AddressReport,
    /// Indirection layer forwarding to another resource.
    Proxy,
}

/// The immutable build recipe for a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionPayload {
    /// Creation code handed to the ledger.
    pub code: &'static [u8],
    /// Post-construction initializer entrypoint, if the kind has one.
    pub initializer: Option<&'static str>,
}

impl ConstructionPayload {
    const fn new(code: &'static [u8], initializer: Option<&'static str>) -> Self {
        Self { code, initializer }
    }
}

static FUNGIBLE_TOKEN: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:fungible-token:v1", Some("initialize"));
static COLLECTIBLE_TOKEN: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:collectible-token:v1", Some("initialize"));
static CLAIM_VAULT: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:claim-vault:v1", None);
static FAUCET: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:faucet:v1", Some("configure"));
static FEE_COLLECTOR: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:fee-collector:v1", None);
static GUARDIAN_RECOVERY: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:guardian-recovery:v2", Some("setup"));
static ADDRESS_REPORT: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:address-report:v1", None);
static PROXY: ConstructionPayload =
    ConstructionPayload::new(b"\x60\x80tether:proxy:v1", Some("upgrade_to"));

impl ResourceKind {
    /// Every catalog entry, in declaration order.
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::FungibleToken,
        ResourceKind::CollectibleToken,
        ResourceKind::ClaimVault,
        ResourceKind::Faucet,
        ResourceKind::FeeCollector,
        ResourceKind::GuardianRecovery,
        ResourceKind::AddressReport,
        ResourceKind::Proxy,
    ];

    /// Returns the stable name used in wiring keys and diagnostics.
    ///
    /// Names never contain `_`, which keeps `"<Kind>_<Namespace>"` keys
    /// unambiguous.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FungibleToken => "FungibleToken",
            Self::CollectibleToken => "CollectibleToken",
            Self::ClaimVault => "ClaimVault",
            Self::Faucet => "Faucet",
            Self::FeeCollector => "FeeCollector",
            Self::GuardianRecovery => "GuardianRecovery",
            Self::AddressReport => "AddressReport",
            Self::Proxy => "Proxy",
        }
    }

    /// Returns the construction payload for this kind.
    #[must_use]
    pub fn construction_payload(self) -> &'static ConstructionPayload {
        match self {
            Self::FungibleToken => &FUNGIBLE_TOKEN,
            Self::CollectibleToken => &COLLECTIBLE_TOKEN,
            Self::ClaimVault => &CLAIM_VAULT,
            Self::Faucet => &FAUCET,
            Self::FeeCollector => &FEE_COLLECTOR,
            Self::GuardianRecovery => &GUARDIAN_RECOVERY,
            Self::AddressReport => &ADDRESS_REPORT,
            Self::Proxy => &PROXY,
        }
    }

    /// Looks a kind up by its stable name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownResourceKind`] if no entry has that name.
    pub fn from_name(name: &str) -> Result<Self, CatalogError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| CatalogError::UnknownResourceKind(name.to_string()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    #[test]
    fn names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_name(kind.name()), Ok(kind));
        }
    }

    #[test]
    fn names_are_unique_and_underscore_free() {
        let names: HashSet<_> = ResourceKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ResourceKind::ALL.len());
        assert!(names.iter().all(|name| !name.contains('_')));
    }

    #[test]
    fn every_kind_has_a_distinct_payload() {
        let codes: HashSet<_> = ResourceKind::ALL
            .iter()
            .map(|k| k.construction_payload().code)
            .collect();
        assert_eq!(codes.len(), ResourceKind::ALL.len());
        assert!(codes.iter().all(|code| !code.is_empty()));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "Bridge".parse::<ResourceKind>().unwrap_err();
        assert_eq!(err, CatalogError::UnknownResourceKind("Bridge".into()));
        assert_eq!(err.to_string(), "unknown resource kind: Bridge");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(ResourceKind::from_name("faucet").is_err());
    }

    #[test]
    fn initializers_match_table() {
        assert_eq!(
            ResourceKind::Proxy.construction_payload().initializer,
            Some("upgrade_to")
        );
        assert_eq!(ResourceKind::ClaimVault.construction_payload().initializer, None);
    }
}
