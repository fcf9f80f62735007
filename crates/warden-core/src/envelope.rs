//! The trust envelope: payload plus provenance metadata.
//!
//! Every wrapping combinator produces or passes through an [`Envelope`]; the
//! host only ever observes its three fields. Envelopes are immutable values:
//! combinators construct fresh ones rather than mutating, so they need no
//! synchronization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::trust::TrustLevel;

/// Default warning inserted when an untrusted envelope carries no explanation.
pub const DEFAULT_UNTRUSTED_WARNING: &str = "Data from untrusted source";

/// A tool result annotated with trust metadata.
///
/// # Invariants
///
/// - An `Untrusted` envelope always has at least one warning; construction
///   through [`Envelope::new`] inserts [`DEFAULT_UNTRUSTED_WARNING`] if none
///   was supplied.
/// - `warnings` preserves insertion order and may contain duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The payload. `Value::Null` for rejected calls.
    pub data: Value,
    /// Provenance confidence for `data`.
    pub trust_level: TrustLevel,
    /// Everything the pipeline and combinators flagged, in order.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Envelope {
    /// Construct an envelope, enforcing the untrusted-needs-warning invariant.
    pub fn new(data: Value, trust_level: TrustLevel, warnings: Vec<String>) -> Self {
        let mut warnings = warnings;
        if trust_level == TrustLevel::Untrusted && warnings.is_empty() {
            warnings.push(DEFAULT_UNTRUSTED_WARNING.to_string());
        }
        Self {
            data,
            trust_level,
            warnings,
        }
    }

    /// An envelope from a developer-verified source, no warnings.
    pub fn trusted(data: Value) -> Self {
        Self::new(data, TrustLevel::Trusted, Vec::new())
    }

    /// An envelope from an unverified external source. Receives the default
    /// warning via the construction invariant.
    pub fn untrusted(data: Value) -> Self {
        Self::new(data, TrustLevel::Untrusted, Vec::new())
    }

    /// A rejection envelope: no data, untrusted, one explanatory warning.
    /// Used when a guard refuses to invoke the wrapped operation at all.
    pub fn rejected(warning: impl Into<String>) -> Self {
        Self::new(Value::Null, TrustLevel::Untrusted, vec![warning.into()])
    }
}

/// What a tool operation hands back: either a bare payload or an envelope an
/// inner combinator already constructed.
///
/// Combinators consume this by exhaustive matching; there is no runtime type
/// inspection anywhere in the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// A payload no combinator has judged yet.
    Raw(Value),
    /// An envelope produced by an inner combinator.
    Secured(Envelope),
}

impl ToolResult {
    /// Unwrap to exactly one envelope layer.
    ///
    /// A raw payload that reaches the host without any combinator judging it
    /// is treated as least-trusted, matching the sanitize combinator's
    /// default for un-annotated results.
    pub fn into_envelope(self) -> Envelope {
        match self {
            ToolResult::Raw(data) => Envelope::untrusted(data),
            ToolResult::Secured(envelope) => envelope,
        }
    }

    /// Returns true if an inner combinator already produced an envelope.
    #[inline]
    pub fn is_secured(&self) -> bool {
        matches!(self, ToolResult::Secured(_))
    }
}

impl From<Value> for ToolResult {
    fn from(value: Value) -> Self {
        ToolResult::Raw(value)
    }
}

impl From<Envelope> for ToolResult {
    fn from(envelope: Envelope) -> Self {
        ToolResult::Secured(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untrusted_without_warnings_gets_default() {
        let envelope = Envelope::new(json!("x"), TrustLevel::Untrusted, Vec::new());
        assert_eq!(envelope.warnings, vec![DEFAULT_UNTRUSTED_WARNING.to_string()]);
    }

    #[test]
    fn test_untrusted_with_warnings_unchanged() {
        let envelope = Envelope::new(
            json!("x"),
            TrustLevel::Untrusted,
            vec!["specific reason".to_string()],
        );
        assert_eq!(envelope.warnings, vec!["specific reason".to_string()]);
    }

    #[test]
    fn test_trusted_may_have_no_warnings() {
        let envelope = Envelope::trusted(json!(42));
        assert!(envelope.warnings.is_empty());
        assert_eq!(envelope.trust_level, TrustLevel::Trusted);
    }

    #[test]
    fn test_warnings_keep_order_and_duplicates() {
        let envelope = Envelope::new(
            json!(null),
            TrustLevel::Caution,
            vec!["a".into(), "b".into(), "a".into()],
        );
        assert_eq!(envelope.warnings, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_rejected_shape() {
        let envelope = Envelope::rejected("Input validation failed");
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.trust_level, TrustLevel::Untrusted);
        assert_eq!(envelope.warnings, vec!["Input validation failed"]);
    }

    #[test]
    fn test_raw_into_envelope_is_least_trusted() {
        let envelope = ToolResult::Raw(json!("data")).into_envelope();
        assert_eq!(envelope.trust_level, TrustLevel::Untrusted);
        assert_eq!(envelope.warnings, vec![DEFAULT_UNTRUSTED_WARNING.to_string()]);
    }

    #[test]
    fn test_secured_into_envelope_is_identity() {
        let original = Envelope::new(json!("x"), TrustLevel::Caution, vec!["w".into()]);
        let envelope = ToolResult::Secured(original.clone()).into_envelope();
        assert_eq!(envelope, original);
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = Envelope::untrusted(json!({"k": 1}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["trust_level"], "untrusted");
        assert_eq!(json["data"]["k"], 1);
        assert!(json["warnings"].is_array());
    }
}
