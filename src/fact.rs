//! Fact identifiers - the opaque currency of the crossing engine.
//!
//! A `Fact` names one active signal at one discrete time step: a quantized
//! sensor bit produced by the encoder, or a feedback signal derived from an
//! active context. Facts carry no payload beyond identity; the engine only
//! ever compares, hashes, and orders them.
//!
//! Fact collections handed to the engine must be sorted and duplicate-free
//! (the caller contract). [`normalize`] puts an arbitrary collection into
//! that form.
//!
//! # Examples
//!
//! ```
//! use contexture::fact::{normalize, Fact};
//!
//! let mut facts = vec![Fact::new(7), Fact::new(3), Fact::new(7)];
//! normalize(&mut facts);
//! assert_eq!(facts, vec![Fact::new(3), Fact::new(7)]);
//! ```

use serde::{Deserialize, Serialize};

/// An opaque, totally-ordered identifier for one active signal.
///
/// Facts are plain `u32` values under the hood so that fact sets stay compact
/// and hashing stays cheap. The encoder reserves disjoint ranges for sensor
/// bits and feedback signals; the engine itself attaches no meaning to the
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fact(u32);

impl Fact {
    /// Create a fact from its raw identifier.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Fact(raw)
    }

    /// Get the raw identifier.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for Fact {
    #[inline]
    fn from(raw: u32) -> Self {
        Fact(raw)
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sort a fact collection and drop duplicates, in place.
///
/// After this call the collection satisfies the engine's caller contract:
/// strictly ascending, no repeats.
pub fn normalize(facts: &mut Vec<Fact>) {
    facts.sort_unstable();
    facts.dedup();
}

/// Check whether a fact slice is strictly ascending (sorted, duplicate-free).
///
/// Used in `debug_assert!` guards at the engine boundary; release builds
/// trust the caller (see the crate-level contract notes).
#[inline]
pub fn is_normalized(facts: &[Fact]) -> bool {
    facts.windows(2).all(|w| w[0] < w[1])
}
