//! Wiring requests and their external encodings.
//!
//! A [`WiringRequest`] names one resource and the strategy used to provision
//! it. Requests arrive either typed, from Rust code, or encoded:
//!
//! - as bytes, via [`WiringRequest::decode`]
//! - as a JSON [`WiringPlan`]
//!
//! Both encodings are decoded in full before the engine sees the request, so
//! a malformed request never causes a side effect.
//!
//! # Binary layout
//!
//! ```text
//! request   = 0x00 str(kind)                      plain
//!           | 0x01 str(kind) str(namespace)       nicknamed
//!           | 0x02 composite                      wrapped composite
//! composite = 0x00 str(outer) str(inner)          wrap inner behind outer
//!           | 0x01 str(kind) str(namespace)       named compound instance
//! str       = u16 big-endian length ‖ UTF-8 bytes
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};
use tether_system::catalog::ResourceKind;
use tether_system::identity::Namespace;
use tether_system::key::WiringKey;

use crate::composite::CompositeUnit;
use crate::error::WiringError;

const STRATEGY_PLAIN: u8 = 0;
const STRATEGY_NICKNAMED: u8 = 1;
const STRATEGY_COMPOSITE: u8 = 2;

const COMPOSITE_WRAP: u8 = 0;
const COMPOSITE_NAMED_INSTANCE: u8 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Typed requests
// ─────────────────────────────────────────────────────────────────────────────

/// One resource to wire, with its provisioning strategy.
pub enum WiringRequest {
    /// The single un-namespaced instance of a kind, keyed `"<Kind>"`.
    Plain(ResourceKind),
    /// A namespaced instance of a kind, keyed `"<Kind>_<Namespace>"`.
    Nicknamed(ResourceKind, Namespace),
    /// A multi-step provisioning flow.
    Composite(CompositeRequest),
}

/// The two composite flavors.
pub enum CompositeRequest {
    /// A caller-supplied unit that performs and records its own steps.
    Bare(Box<dyn CompositeUnit>),
    /// A built-in flow selected by a decoded payload.
    Wrapped(CompositePayload),
}

/// Payload of a wrapped composite request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositePayload {
    /// Provision `inner` plainly, then put `outer` in front of it.
    ///
    /// The outer resource is recorded under `"<Outer>_<Inner>"`.
    Wrap {
        /// The indirection layer, usually [`ResourceKind::Proxy`].
        outer: ResourceKind,
        /// The resource being wrapped.
        inner: ResourceKind,
    },
    /// Provision `kind` plainly as a template, then a named instance built
    /// from it.
    NamedInstance {
        /// The template kind.
        kind: ResourceKind,
        /// The instance namespace.
        namespace: Namespace,
    },
}

impl CompositePayload {
    /// Key under which the composite's outward-facing resource is recorded.
    #[must_use]
    pub fn outer_key(&self) -> WiringKey {
        match self {
            Self::Wrap { outer, inner } => WiringKey::nicknamed(*outer, Namespace::of_kind(*inner)),
            Self::NamedInstance { kind, namespace } => {
                WiringKey::nicknamed(*kind, namespace.clone())
            }
        }
    }
}

impl WiringRequest {
    /// Shorthand for a plain request.
    #[must_use]
    pub fn plain(kind: ResourceKind) -> Self {
        Self::Plain(kind)
    }

    /// Shorthand for a nicknamed request.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::InvalidNamespace`] if `namespace` is invalid.
    pub fn nicknamed(kind: ResourceKind, namespace: &str) -> Result<Self, WiringError> {
        Ok(Self::Nicknamed(kind, Namespace::new(namespace)?))
    }

    /// Shorthand for a bare composite request.
    #[must_use]
    pub fn bare(unit: impl CompositeUnit + 'static) -> Self {
        Self::Composite(CompositeRequest::Bare(Box::new(unit)))
    }

    /// Shorthand for wrapping `inner` behind `outer`.
    #[must_use]
    pub fn wrap(outer: ResourceKind, inner: ResourceKind) -> Self {
        Self::Composite(CompositeRequest::Wrapped(CompositePayload::Wrap {
            outer,
            inner,
        }))
    }

    /// Key of the entry this request ultimately produces, if it has one.
    ///
    /// Bare composites record whatever they choose and have no single key.
    #[must_use]
    pub fn key(&self) -> Option<WiringKey> {
        match self {
            Self::Plain(kind) => Some(WiringKey::plain(*kind)),
            Self::Nicknamed(kind, namespace) => Some(WiringKey::nicknamed(*kind, namespace.clone())),
            Self::Composite(CompositeRequest::Wrapped(payload)) => Some(payload.outer_key()),
            Self::Composite(CompositeRequest::Bare(_)) => None,
        }
    }

    /// Label used in diagnostics, `kind` or `kind/namespace`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Composite(CompositeRequest::Bare(unit)) => unit.name().to_string(),
            other => other.key().map(|key| key.label()).unwrap_or_default(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binary codec
    // ─────────────────────────────────────────────────────────────────────

    /// Decodes a request from its binary form.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnsupportedWiringShape`] for an unknown
    /// discriminator, truncated input or trailing bytes, and
    /// [`WiringError::UnknownResourceKind`] for a kind outside the catalog.
    pub fn decode(bytes: &[u8]) -> Result<Self, WiringError> {
        let mut reader = Reader::new(bytes);
        let request = match reader.byte("strategy")? {
            STRATEGY_PLAIN => Self::Plain(reader.kind()?),
            STRATEGY_NICKNAMED => Self::Nicknamed(reader.kind()?, reader.namespace()?),
            STRATEGY_COMPOSITE => {
                let payload = match reader.byte("composite flag")? {
                    COMPOSITE_WRAP => CompositePayload::Wrap {
                        outer: reader.kind()?,
                        inner: reader.kind()?,
                    },
                    COMPOSITE_NAMED_INSTANCE => CompositePayload::NamedInstance {
                        kind: reader.kind()?,
                        namespace: reader.namespace()?,
                    },
                    flag => {
                        return Err(WiringError::UnsupportedWiringShape(format!(
                            "unknown composite flag {flag}"
                        )));
                    }
                };
                Self::Composite(CompositeRequest::Wrapped(payload))
            }
            strategy => {
                return Err(WiringError::UnsupportedWiringShape(format!(
                    "unknown strategy discriminator {strategy}"
                )));
            }
        };
        reader.finish()?;
        Ok(request)
    }

    /// Encodes the request in its binary form.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnsupportedWiringShape`] for a bare composite,
    /// which carries code rather than data.
    pub fn encode(&self) -> Result<Vec<u8>, WiringError> {
        let mut out = Vec::new();
        match self {
            Self::Plain(kind) => {
                out.push(STRATEGY_PLAIN);
                put_str(&mut out, kind.name());
            }
            Self::Nicknamed(kind, namespace) => {
                out.push(STRATEGY_NICKNAMED);
                put_str(&mut out, kind.name());
                put_str(&mut out, namespace.as_str());
            }
            Self::Composite(CompositeRequest::Wrapped(payload)) => {
                out.push(STRATEGY_COMPOSITE);
                match payload {
                    CompositePayload::Wrap { outer, inner } => {
                        out.push(COMPOSITE_WRAP);
                        put_str(&mut out, outer.name());
                        put_str(&mut out, inner.name());
                    }
                    CompositePayload::NamedInstance { kind, namespace } => {
                        out.push(COMPOSITE_NAMED_INSTANCE);
                        put_str(&mut out, kind.name());
                        put_str(&mut out, namespace.as_str());
                    }
                }
            }
            Self::Composite(CompositeRequest::Bare(unit)) => {
                return Err(WiringError::UnsupportedWiringShape(format!(
                    "bare composite {} cannot be encoded",
                    unit.name()
                )));
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for WiringRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(kind) => f.debug_tuple("Plain").field(kind).finish(),
            Self::Nicknamed(kind, namespace) => {
                f.debug_tuple("Nicknamed").field(kind).field(namespace).finish()
            }
            Self::Composite(request) => f.debug_tuple("Composite").field(request).finish(),
        }
    }
}

impl fmt::Debug for CompositeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(unit) => f.debug_tuple("Bare").field(&unit.name()).finish(),
            Self::Wrapped(payload) => f.debug_tuple("Wrapped").field(payload).finish(),
        }
    }
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    // Kind names and namespaces are bounded far below u16::MAX.
    let len = u16::try_from(value.len()).unwrap_or(u16::MAX);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&value.as_bytes()[..usize::from(len)]);
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], WiringError> {
        let end = self.offset.checked_add(len).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(WiringError::UnsupportedWiringShape(format!(
                "truncated {what} at byte {}",
                self.offset
            )));
        };
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn byte(&mut self, what: &str) -> Result<u8, WiringError> {
        Ok(self.take(1, what)?[0])
    }

    fn string(&mut self, what: &str) -> Result<&'a str, WiringError> {
        let len = self.take(2, what)?;
        let len = u16::from_be_bytes([len[0], len[1]]);
        let raw = self.take(usize::from(len), what)?;
        core::str::from_utf8(raw)
            .map_err(|_| WiringError::UnsupportedWiringShape(format!("{what} is not UTF-8")))
    }

    fn kind(&mut self) -> Result<ResourceKind, WiringError> {
        Ok(ResourceKind::from_name(self.string("kind")?)?)
    }

    fn namespace(&mut self) -> Result<Namespace, WiringError> {
        Ok(Namespace::new(self.string("namespace")?)?)
    }

    fn finish(self) -> Result<(), WiringError> {
        if self.offset == self.bytes.len() {
            Ok(())
        } else {
            Err(WiringError::UnsupportedWiringShape(format!(
                "{} trailing bytes",
                self.bytes.len() - self.offset
            )))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────────────────────────

/// One step of a JSON wiring plan, as written by humans and tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case", deny_unknown_fields)]
pub enum PlanStep {
    /// `{"strategy": "plain", "kind": "Faucet"}`
    Plain {
        /// Kind name.
        kind: String,
    },
    /// `{"strategy": "nicknamed", "kind": "Faucet", "namespace": "usdc"}`
    Nicknamed {
        /// Kind name.
        kind: String,
        /// Instance namespace.
        namespace: String,
    },
    /// `{"strategy": "wrap", "outer": "Proxy", "inner": "GuardianRecovery"}`
    Wrap {
        /// Outer kind name.
        outer: String,
        /// Inner kind name.
        inner: String,
    },
    /// `{"strategy": "named_instance", "kind": "ClaimVault", "namespace": "airdrop"}`
    NamedInstance {
        /// Template kind name.
        kind: String,
        /// Instance namespace.
        namespace: String,
    },
}

impl PlanStep {
    /// Converts the step into a typed request.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnknownResourceKind`] or
    /// [`WiringError::InvalidNamespace`] for bad fields.
    pub fn to_request(&self) -> Result<WiringRequest, WiringError> {
        let request = match self {
            Self::Plain { kind } => WiringRequest::Plain(kind.parse()?),
            Self::Nicknamed { kind, namespace } => {
                WiringRequest::Nicknamed(kind.parse()?, namespace.parse()?)
            }
            Self::Wrap { outer, inner } => WiringRequest::wrap(outer.parse()?, inner.parse()?),
            Self::NamedInstance { kind, namespace } => WiringRequest::Composite(
                CompositeRequest::Wrapped(CompositePayload::NamedInstance {
                    kind: kind.parse()?,
                    namespace: namespace.parse()?,
                }),
            ),
        };
        Ok(request)
    }
}

/// An ordered list of requests loaded from JSON.
///
/// # Example
///
/// ```
/// use tether_wiring::request::WiringPlan;
///
/// let plan = WiringPlan::from_json(r#"{"requests": [
///     {"strategy": "plain", "kind": "FeeCollector"},
///     {"strategy": "wrap", "outer": "Proxy", "inner": "GuardianRecovery"}
/// ]}"#).unwrap();
/// let requests = plan.requests().unwrap();
/// assert_eq!(requests.len(), 2);
/// assert_eq!(requests[1].label(), "Proxy/GuardianRecovery");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringPlan {
    /// Steps in execution order.
    pub requests: Vec<PlanStep>,
}

impl WiringPlan {
    /// Parses a plan document.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnsupportedWiringShape`] if the JSON does not
    /// match the plan shape, including unknown strategies.
    pub fn from_json(json: &str) -> Result<Self, WiringError> {
        serde_json::from_str(json).map_err(|err| WiringError::UnsupportedWiringShape(err.to_string()))
    }

    /// Converts every step, failing on the first bad one.
    ///
    /// # Errors
    ///
    /// See [`PlanStep::to_request`].
    pub fn requests(&self) -> Result<Vec<WiringRequest>, WiringError> {
        self.requests.iter().map(PlanStep::to_request).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_layout() {
        let bytes = WiringRequest::Plain(ResourceKind::Faucet).encode().unwrap();
        assert_eq!(bytes, [&[0u8, 0, 6][..], &b"Faucet"[..]].concat());
    }

    #[test]
    fn wrapped_decodes() {
        let bytes = WiringRequest::wrap(ResourceKind::Proxy, ResourceKind::GuardianRecovery)
            .encode()
            .unwrap();
        let decoded = WiringRequest::decode(&bytes).unwrap();
        assert_eq!(
            decoded.key().unwrap().to_string(),
            "Proxy_GuardianRecovery"
        );
    }

    #[test]
    fn unknown_discriminator_is_unsupported() {
        assert!(matches!(
            WiringRequest::decode(&[9]),
            Err(WiringError::UnsupportedWiringShape(_))
        ));
        assert!(matches!(
            WiringRequest::decode(&[STRATEGY_COMPOSITE, 7]),
            Err(WiringError::UnsupportedWiringShape(_))
        ));
    }

    #[test]
    fn truncated_and_trailing_input_is_unsupported() {
        let mut bytes = WiringRequest::Plain(ResourceKind::Faucet).encode().unwrap();
        assert!(matches!(
            WiringRequest::decode(&bytes[..4]),
            Err(WiringError::UnsupportedWiringShape(_))
        ));
        bytes.push(0);
        assert!(matches!(
            WiringRequest::decode(&bytes),
            Err(WiringError::UnsupportedWiringShape(_))
        ));
        assert!(matches!(
            WiringRequest::decode(&[]),
            Err(WiringError::UnsupportedWiringShape(_))
        ));
    }

    #[test]
    fn unknown_kind_in_payload() {
        let mut bytes = vec![STRATEGY_PLAIN];
        put_str(&mut bytes, "Bridge");
        assert!(matches!(
            WiringRequest::decode(&bytes),
            Err(WiringError::UnknownResourceKind(name)) if name == "Bridge"
        ));
    }

    #[test]
    fn bare_composite_cannot_be_encoded() {
        struct Noop;
        impl CompositeUnit for Noop {
            fn name(&self) -> &str {
                "noop"
            }
            fn run(
                &self,
                _engine: &mut crate::engine::WiringEngine<'_>,
            ) -> Result<Option<tether_system::identity::Location>, WiringError> {
                Ok(None)
            }
        }
        let request = WiringRequest::bare(Noop);
        assert_eq!(request.label(), "noop");
        assert!(request.key().is_none());
        assert!(matches!(
            request.encode(),
            Err(WiringError::UnsupportedWiringShape(_))
        ));
    }

    #[test]
    fn plan_rejects_unknown_strategy() {
        let err = WiringPlan::from_json(r#"{"requests": [{"strategy": "teleport", "kind": "Faucet"}]}"#)
            .unwrap_err();
        assert!(matches!(err, WiringError::UnsupportedWiringShape(_)));
    }

    #[test]
    fn plan_rejects_unknown_kind_at_conversion() {
        let plan = WiringPlan::from_json(r#"{"requests": [{"strategy": "plain", "kind": "Bridge"}]}"#)
            .unwrap();
        assert!(matches!(
            plan.requests(),
            Err(WiringError::UnknownResourceKind(_))
        ));
    }

    #[test]
    fn plan_named_instance() {
        let plan = WiringPlan::from_json(
            r#"{"requests": [{"strategy": "named_instance", "kind": "ClaimVault", "namespace": "airdrop"}]}"#,
        )
        .unwrap();
        let requests = plan.requests().unwrap();
        assert_eq!(requests[0].key().unwrap().to_string(), "ClaimVault_airdrop");
    }
}
