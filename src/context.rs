//! Context records - learned left/right pattern pairs and their statistics.
//!
//! A context pairs one left semi-context (antecedent) with one right
//! semi-context (consequent). The pair identity lives in the left side's
//! per-record map; the arena here stores only the evidence counters, the
//! consequent facts replayed into predictions, and the zero-level marker.
//!
//! Counters accumulate set sizes, not event counts: each time the left side
//! is fully matched, `c0` grows by the full size of the right defining set
//! and `c1` by the number of right facts actually observed. Their ratio is
//! the prediction weight - the average observed fraction of the consequent.

use crate::fact::Fact;
use serde::{Deserialize, Serialize};

/// Identifier of a context within the engine's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextId(u32);

impl ContextId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        ContextId(index as u32)
    }

    /// Create a ContextId from a raw u32 value (for testing).
    #[doc(hidden)]
    pub fn from_raw(id: u32) -> Self {
        ContextId(id)
    }

    /// Get the raw value as an array index.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// One learned context.
///
/// Created with zeroed counters. `right_facts` is fixed at creation and is
/// what the prediction loop unions into the next-step forecast.
#[derive(Debug, Clone)]
pub struct Context {
    // Evidence counters
    c0: usize,
    c1: usize,
    num_activations: usize,

    // Consequent facts replayed into predictions
    right_facts: Box<[Fact]>,

    // True for contexts born from (or upgraded by) a whole-step pairing
    zerolevel: bool,
}

impl Context {
    pub(crate) fn new(right_facts: Box<[Fact]>, zerolevel: bool) -> Self {
        Self {
            c0: 0,
            c1: 0,
            num_activations: 0,
            right_facts,
            zerolevel,
        }
    }

    /// Accumulated right-side potential: sum of the right defining set size
    /// over every step this context was selected.
    #[inline]
    pub fn c0(&self) -> usize {
        self.c0
    }

    /// Accumulated right-side evidence: sum of observed right facts over
    /// every step this context was selected. Never exceeds [`c0`](Self::c0).
    #[inline]
    pub fn c1(&self) -> usize {
        self.c1
    }

    /// Number of steps on which both sides were fully matched.
    #[inline]
    pub fn num_activations(&self) -> usize {
        self.num_activations
    }

    /// Consequent facts (ascending).
    #[inline]
    pub fn right_facts(&self) -> &[Fact] {
        &self.right_facts
    }

    /// True when this context learns whole-step pairings.
    #[inline]
    pub fn is_zerolevel(&self) -> bool {
        self.zerolevel
    }

    /// Observed fraction of the consequent, averaged over selections.
    /// Zero until the first selection.
    #[inline]
    pub fn prediction_weight(&self) -> f64 {
        if self.c0 > 0 {
            self.c1 as f64 / self.c0 as f64
        } else {
            0.0
        }
    }

    /// Record one selection: the left side was fully matched while the right
    /// side had `right_active` of its `right_init` defining facts observed.
    pub(crate) fn record_selection(&mut self, right_init: usize, right_active: usize) {
        debug_assert!(right_active <= right_init);
        self.c0 += right_init;
        self.c1 += right_active;
    }

    /// Record one full activation and return the updated count.
    pub(crate) fn record_activation(&mut self) -> usize {
        self.num_activations += 1;
        self.num_activations
    }

    pub(crate) fn mark_zerolevel(&mut self) {
        self.zerolevel = true;
    }

    pub(crate) fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.right_facts.len() * std::mem::size_of::<Fact>()
    }
}

/// A context whose both sides were fully matched on the current step,
/// together with its activation count at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveContext {
    pub ctx_id: ContextId,
    pub num_activations: usize,
}

/// A generalization proposal: the observed left/right active subsets of a
/// partially matched zero-level context, captured as a new pair to learn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateContext {
    pub left: Vec<Fact>,
    pub right: Vec<Fact>,
}

impl CandidateContext {
    pub fn new(left: Vec<Fact>, right: Vec<Fact>) -> Self {
        Self { left, right }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(raw: &[u32]) -> Box<[Fact]> {
        raw.iter().copied().map(Fact::new).collect()
    }

    #[test]
    fn test_new_context_has_zeroed_counters() {
        let ctx = Context::new(facts(&[3, 4]), true);
        assert_eq!(ctx.c0(), 0);
        assert_eq!(ctx.c1(), 0);
        assert_eq!(ctx.num_activations(), 0);
        assert!(ctx.is_zerolevel());
        assert_eq!(ctx.prediction_weight(), 0.0);
    }

    #[test]
    fn test_selection_accumulates_set_sizes() {
        let mut ctx = Context::new(facts(&[3, 4]), true);
        ctx.record_selection(2, 2);
        assert_eq!(ctx.c0(), 2);
        assert_eq!(ctx.c1(), 2);
        assert_eq!(ctx.prediction_weight(), 1.0);

        ctx.record_selection(2, 1);
        assert_eq!(ctx.c0(), 4);
        assert_eq!(ctx.c1(), 3);
        assert_eq!(ctx.prediction_weight(), 0.75);
    }

    #[test]
    fn test_c1_never_exceeds_c0() {
        let mut ctx = Context::new(facts(&[1]), false);
        for observed in [0, 1, 1, 0, 1] {
            ctx.record_selection(1, observed);
            assert!(ctx.c1() <= ctx.c0());
        }
    }

    #[test]
    fn test_activation_count_is_post_increment() {
        let mut ctx = Context::new(facts(&[9]), true);
        assert_eq!(ctx.record_activation(), 1);
        assert_eq!(ctx.record_activation(), 2);
        assert_eq!(ctx.num_activations(), 2);
    }

    #[test]
    fn test_zerolevel_upgrade() {
        let mut ctx = Context::new(facts(&[5]), false);
        assert!(!ctx.is_zerolevel());
        ctx.mark_zerolevel();
        assert!(ctx.is_zerolevel());
    }

    #[test]
    fn test_candidate_equality_is_structural() {
        let a = CandidateContext::new(
            facts(&[1, 2]).into_vec(),
            facts(&[3]).into_vec(),
        );
        let b = CandidateContext::new(
            facts(&[1, 2]).into_vec(),
            facts(&[3]).into_vec(),
        );
        let c = CandidateContext::new(
            facts(&[1, 2]).into_vec(),
            facts(&[4]).into_vec(),
        );
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
