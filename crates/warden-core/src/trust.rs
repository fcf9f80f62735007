//! The trust lattice.
//!
//! A three-valued, totally ordered trust indicator plus the single transition
//! rule every combinator uses. Trust only ever moves down: new warnings
//! downgrade one step at a time, and nothing raises trust once lowered.

use serde::{Deserialize, Serialize};

/// How much a payload can be trusted, ordered `Untrusted < Caution < Trusted`.
///
/// `Untrusted` is the lattice bottom: once there, no sequence of warnings
/// (or their absence) moves a payload back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    /// Known problematic or unverified external source.
    Untrusted,
    /// Use with care; sanitization found something worth flagging.
    Caution,
    /// Developer-verified internal source.
    Trusted,
}

impl TrustLevel {
    /// Apply the monotonic downgrade rule for a batch of new warnings.
    ///
    /// With no new warnings the prior level is kept (trust never improves on
    /// its own). With any new warnings, trust drops exactly one step:
    /// `Trusted -> Caution`, `Caution -> Untrusted`, and `Untrusted` stays at
    /// the floor.
    ///
    /// This is a pure function and the single authority for trust
    /// transitions; combinators never adjust trust any other way.
    #[must_use]
    pub fn downgrade(self, new_warnings: &[String]) -> TrustLevel {
        if new_warnings.is_empty() {
            return self;
        }
        match self {
            TrustLevel::Trusted => TrustLevel::Caution,
            TrustLevel::Caution | TrustLevel::Untrusted => TrustLevel::Untrusted,
        }
    }

    /// Returns true for the top of the lattice.
    #[inline]
    pub fn is_trusted(&self) -> bool {
        matches!(self, TrustLevel::Trusted)
    }

    /// Returns true for the bottom of the lattice.
    #[inline]
    pub fn is_untrusted(&self) -> bool {
        matches!(self, TrustLevel::Untrusted)
    }
}
