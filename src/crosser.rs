//! Context-crossing engine - incremental sequence learning over fact sets.
//!
//! The engine learns antecedent/consequent pairings between consecutive
//! steps of a fact stream and forecasts the next step's facts. Each step is
//! driven as two phases:
//!
//! 1. [`cross_right`](ContextCrosser::cross_right) - match the current facts
//!    against stored right (consequent) sides, score every context whose
//!    left side matched on the previous step, and capture generalization
//!    candidates from partially confirmed zero-level contexts.
//! 2. [`cross_left`](ContextCrosser::cross_left) - match the step's full
//!    fact group against stored left (antecedent) sides, learn the captured
//!    candidates, and emit the forecast for the next step.
//!
//! Growth is monotone: semi-contexts and contexts are only ever added, and
//! ids are stable for the life of the engine. A context created from the
//! current step's own pairing is excluded from that step's scoring so it
//! cannot confirm itself.
//!
//! # Examples
//!
//! ```
//! use contexture::crosser::ContextCrosser;
//! use contexture::fact::Fact;
//!
//! fn f(raw: &[u32]) -> Vec<Fact> {
//!     raw.iter().copied().map(Fact::new).collect()
//! }
//!
//! // Alternating stream: {1,2}, {3,4}, {1,2}, {3,4}
//! let mut engine = ContextCrosser::new(7);
//! let ab = f(&[1, 2]);
//! let cd = f(&[3, 4]);
//!
//! // Step 1: first observation, nothing to pair yet.
//! engine.cross_right(&ab, None);
//! let out = engine.cross_left(&ab, &[]);
//! assert!(out.prediction.is_empty());
//!
//! // Step 2: pair the previous step with the current one.
//! engine.cross_right(&cd, Some((&ab, &cd)));
//! engine.cross_left(&cd, &[]);
//!
//! // Step 3: the learned pairing now yields a forecast.
//! engine.cross_right(&ab, Some((&cd, &ab)));
//! let out = engine.cross_left(&ab, &[]);
//! assert_eq!(out.prediction, f(&[3, 4]));
//!
//! // Step 4: the forecast comes true and the context activates.
//! let right = engine.cross_right(&cd, Some((&ab, &cd)));
//! assert_eq!(right.num_selected, 1);
//! assert_eq!(right.active.len(), 1);
//! assert_eq!(right.active[0].num_activations, 1);
//! let out = engine.cross_left(&cd, &[]);
//! assert_eq!(out.prediction, f(&[1, 2]));
//! ```

use crate::context::{ActiveContext, CandidateContext, Context, ContextId};
use crate::fact::{is_normalized, Fact};
use crate::semi_context::SemiContextIndex;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Outcome of the right-side crossing phase.
#[derive(Debug, Clone, Default)]
pub struct RightCrossing {
    /// Contexts fully matched on both sides this step, with their updated
    /// activation counts, in ascending (left id, right id) emission order.
    pub active: Vec<ActiveContext>,

    /// Number of contexts whose left side was fully matched this step.
    pub num_selected: usize,

    /// Generalization proposals captured from partially confirmed zero-level
    /// contexts, deduplicated, in emission order.
    pub candidates: Vec<CandidateContext>,

    /// Zero-level contexts created from the step pairing (0 or 1).
    pub num_new_contexts: usize,
}

/// Outcome of the left-side crossing phase.
#[derive(Debug, Clone, Default)]
pub struct LeftCrossing {
    /// Contexts newly created from the generalization candidates.
    pub num_new_contexts: usize,

    /// Forecast for the next step: the union of consequents of every
    /// maximum-weight context reachable from a fully matched left side,
    /// ascending.
    pub prediction: Vec<Fact>,
}

struct AddOutcome {
    created: bool,
    ctx_id: ContextId,
}

/// Incremental context-crossing engine.
///
/// Holds the left and right semi-context indexes and the context arena.
/// Single-stream by construction: one engine learns one fact stream, and all
/// state advances only through the two-phase step protocol.
#[derive(Debug, Clone)]
pub struct ContextCrosser {
    // Parameters
    max_left_len: usize,

    // State
    left: SemiContextIndex,
    right: SemiContextIndex,
    contexts: Vec<Context>,
}

impl ContextCrosser {
    /// Create an empty engine.
    ///
    /// # Arguments
    ///
    /// * `max_left_len` - longest left active subset a generalization
    ///   candidate may be captured from. Must be positive.
    pub fn new(max_left_len: usize) -> Self {
        assert!(max_left_len > 0, "max_left_len must be positive");

        Self {
            max_left_len,
            left: SemiContextIndex::new(),
            right: SemiContextIndex::new(),
            contexts: Vec::new(),
        }
    }

    /// Right-side crossing: score consequents against the current facts.
    ///
    /// Recomputes right-side active subsets from `facts`, then materializes
    /// the zero-level `proposal` (previous step's fact group paired with the
    /// current facts) if given. A context created here is skipped by the
    /// scoring loop below so the step cannot confirm its own pairing; a
    /// proposal whose pair already exists creates nothing and only upgrades
    /// the existing context to zero-level.
    ///
    /// The scoring loop walks every left semi-context matched on the
    /// previous step. For each of its contexts: when the left side was fully
    /// matched the context is selected (`c0` grows by the right defining set
    /// size, `c1` by the observed right facts); a fully observed right side
    /// activates the context; otherwise a partially observed zero-level
    /// context yields a generalization candidate, provided a zero-level
    /// context was created this step, at least one right fact was observed,
    /// and the left active subset is within `max_left_len`.
    ///
    /// # Arguments
    ///
    /// * `facts` - current step's facts, sorted and deduplicated.
    /// * `proposal` - `(left, right)` fact sets for the zero-level pairing,
    ///   both non-empty, sorted, and deduplicated.
    pub fn cross_right(
        &mut self,
        facts: &[Fact],
        proposal: Option<(&[Fact], &[Fact])>,
    ) -> RightCrossing {
        debug_assert!(is_normalized(facts), "facts must be sorted and deduplicated");

        self.right.recompute_active(facts);

        let mut new_ctx_id = None;
        let mut out = RightCrossing::default();
        if let Some((left_facts, right_facts)) = proposal {
            let added = self.add_context(left_facts, right_facts, true);
            if added.created {
                out.num_new_contexts = 1;
                new_ctx_id = Some(added.ctx_id);
            }
        }

        for &lsemi_id in self.left.crossed() {
            let lsemi = self.left.semi(lsemi_id);
            let left_len = lsemi.active().len();

            for (&rsemi_id, &ctx_id) in lsemi.context_map() {
                if Some(ctx_id) == new_ctx_id {
                    continue;
                }
                let rsemi = self.right.semi(rsemi_id);

                if lsemi.is_fully_active() {
                    out.num_selected += 1;
                    let ctx = &mut self.contexts[ctx_id.as_usize()];
                    ctx.record_selection(rsemi.init_nfacts(), rsemi.active().len());

                    if rsemi.is_fully_active() {
                        let num_activations = ctx.record_activation();
                        out.active.push(ActiveContext { ctx_id, num_activations });
                    } else if ctx.is_zerolevel()
                        && out.num_new_contexts > 0
                        && !rsemi.active().is_empty()
                        && left_len <= self.max_left_len
                    {
                        out.candidates.push(CandidateContext::new(
                            lsemi.active().to_vec(),
                            rsemi.active().to_vec(),
                        ));
                    }
                } else if self.contexts[ctx_id.as_usize()].is_zerolevel()
                    && out.num_new_contexts > 0
                    && !rsemi.active().is_empty()
                    && left_len <= self.max_left_len
                {
                    out.candidates.push(CandidateContext::new(
                        lsemi.active().to_vec(),
                        rsemi.active().to_vec(),
                    ));
                }
            }
        }

        out.candidates = out.candidates.into_iter().unique().collect();
        out
    }

    /// Left-side crossing: learn candidates and forecast the next step.
    ///
    /// Recomputes left-side active subsets from `facts`, creates a context
    /// for every candidate pair not seen before (non-zero-level), then scans
    /// every fully matched left semi-context and collects the contexts tied
    /// for the maximum prediction weight. The forecast is the union of their
    /// consequents; ties are kept, including the all-zero-weight case, so a
    /// freshly learned pairing forecasts its consequent before any evidence
    /// accumulates.
    ///
    /// # Arguments
    ///
    /// * `facts` - current step's full fact group, sorted and deduplicated.
    /// * `candidates` - generalization candidates from this step's
    ///   [`cross_right`](Self::cross_right).
    pub fn cross_left(&mut self, facts: &[Fact], candidates: &[CandidateContext]) -> LeftCrossing {
        debug_assert!(is_normalized(facts), "facts must be sorted and deduplicated");

        self.left.recompute_active(facts);

        let mut out = LeftCrossing::default();
        for candidate in candidates {
            let added = self.add_context(&candidate.left, &candidate.right, false);
            if added.created {
                out.num_new_contexts += 1;
            }
        }

        let mut max_weight = 0.0_f64;
        let mut prediction_ctxs: Vec<ContextId> = Vec::new();

        for &lsemi_id in self.left.crossed() {
            let lsemi = self.left.semi(lsemi_id);
            if !lsemi.is_fully_active() {
                continue;
            }
            for &ctx_id in lsemi.context_map().values() {
                let weight = self.contexts[ctx_id.as_usize()].prediction_weight();
                if weight > max_weight {
                    max_weight = weight;
                    prediction_ctxs.clear();
                    prediction_ctxs.push(ctx_id);
                } else if weight == max_weight {
                    prediction_ctxs.push(ctx_id);
                }
            }
        }

        let mut prediction = BTreeSet::new();
        for &ctx_id in &prediction_ctxs {
            prediction.extend(self.contexts[ctx_id.as_usize()].right_facts().iter().copied());
        }
        out.prediction = prediction.into_iter().collect();
        out
    }

    /// Get-or-create the context pairing these exact left and right sets.
    fn add_context(&mut self, left_facts: &[Fact], right_facts: &[Fact], zerolevel: bool) -> AddOutcome {
        let lsemi_id = self.left.register(left_facts);
        let rsemi_id = self.right.register(right_facts);

        let next_id = ContextId::new(self.contexts.len());
        let ctx_id = *self
            .left
            .semi_mut(lsemi_id)
            .ctx_by_rsemi
            .entry(rsemi_id)
            .or_insert(next_id);

        if ctx_id == next_id {
            self.contexts.push(Context::new(right_facts.into(), zerolevel));
            AddOutcome { created: true, ctx_id }
        } else {
            if zerolevel {
                self.contexts[ctx_id.as_usize()].mark_zerolevel();
            }
            AddOutcome { created: false, ctx_id }
        }
    }

    /// Longest left active subset eligible for generalization.
    #[inline]
    pub fn max_left_len(&self) -> usize {
        self.max_left_len
    }

    /// Number of contexts learned so far.
    #[inline]
    pub fn num_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Number of distinct antecedent fact sets registered so far.
    #[inline]
    pub fn num_left_semi_contexts(&self) -> usize {
        self.left.len()
    }

    /// Number of distinct consequent fact sets registered so far.
    #[inline]
    pub fn num_right_semi_contexts(&self) -> usize {
        self.right.len()
    }

    /// Get a context by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not issued by this engine.
    #[inline]
    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.as_usize()]
    }

    /// Left (antecedent) semi-context index.
    #[inline]
    pub fn left(&self) -> &SemiContextIndex {
        &self.left
    }

    /// Right (consequent) semi-context index.
    #[inline]
    pub fn right(&self) -> &SemiContextIndex {
        &self.right
    }

    /// Forget everything learned; parameters are kept.
    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
        self.contexts.clear();
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.left.memory_usage();
        bytes += self.right.memory_usage();
        bytes += self.contexts.iter().map(Context::memory_usage).sum::<usize>();
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(raw: &[u32]) -> Vec<Fact> {
        raw.iter().copied().map(Fact::new).collect()
    }

    #[test]
    fn test_new_engine_is_empty() {
        let engine = ContextCrosser::new(7);
        assert_eq!(engine.num_contexts(), 0);
        assert!(engine.left().is_empty());
        assert!(engine.right().is_empty());
        assert_eq!(engine.max_left_len(), 7);
    }

    #[test]
    #[should_panic(expected = "max_left_len")]
    fn test_zero_max_left_len_panics() {
        let _ = ContextCrosser::new(0);
    }

    #[test]
    fn test_fresh_context_is_excluded_from_scoring() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);

        engine.cross_right(&ab, None);
        engine.cross_left(&ab, &[]);

        engine.cross_right(&ab, Some((&ab, &ab)));
        engine.cross_left(&ab, &[]);

        // The pairing {1,2} -> {3,4} is created on this step, so only the
        // established {1,2} -> {1,2} context is scored.
        let out = engine.cross_right(&cd, Some((&ab, &cd)));
        assert_eq!(out.num_new_contexts, 1);
        assert_eq!(out.num_selected, 1);
        assert!(out.active.is_empty());

        let established = engine.context(ContextId::from_raw(0));
        assert_eq!(established.c0(), 2);
        assert_eq!(established.c1(), 0);

        let fresh = engine.context(ContextId::from_raw(1));
        assert_eq!(fresh.c0(), 0);
        assert_eq!(fresh.c1(), 0);
        assert_eq!(fresh.num_activations(), 0);
    }

    #[test]
    fn test_repeated_proposal_creates_nothing() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);

        engine.cross_right(&cd, Some((&ab, &cd)));
        assert_eq!(engine.num_contexts(), 1);

        let out = engine.cross_right(&cd, Some((&ab, &cd)));
        assert_eq!(out.num_new_contexts, 0);
        assert_eq!(engine.num_contexts(), 1);
    }

    #[test]
    fn test_candidate_captured_from_partial_right_match() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);
        let c = f(&[3]);

        // Learn {1,2} -> {3,4}, then make {1,2} the previous step again.
        engine.cross_right(&ab, None);
        engine.cross_left(&ab, &[]);
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[]);
        engine.cross_right(&ab, Some((&cd, &ab)));
        engine.cross_left(&ab, &[]);

        // Only half the consequent arrives; a new zero-level pairing is also
        // created, which opens the generalization gate.
        let out = engine.cross_right(&c, Some((&ab, &c)));
        assert_eq!(out.num_new_contexts, 1);
        assert_eq!(out.candidates, vec![CandidateContext::new(f(&[1, 2]), f(&[3]))]);
        assert!(out.active.is_empty());

        // Selection accumulated the full right size against the observed one.
        let ctx = engine.context(ContextId::from_raw(0));
        assert_eq!(ctx.c0(), 2);
        assert_eq!(ctx.c1(), 1);
    }

    #[test]
    fn test_candidate_gated_by_max_left_len() {
        let mut engine = ContextCrosser::new(1);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);
        let c = f(&[3]);

        engine.cross_right(&ab, None);
        engine.cross_left(&ab, &[]);
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[]);
        engine.cross_right(&ab, Some((&cd, &ab)));
        engine.cross_left(&ab, &[]);

        // Identical situation to the capture test, but the left active
        // subset has 2 facts and the limit is 1.
        let out = engine.cross_right(&c, Some((&ab, &c)));
        assert_eq!(out.num_new_contexts, 1);
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn test_candidate_gated_by_new_context_creation() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);
        let c = f(&[3]);

        engine.cross_right(&ab, None);
        engine.cross_left(&ab, &[]);
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[]);
        engine.cross_right(&ab, Some((&cd, &ab)));
        engine.cross_left(&ab, &[]);
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[]);
        engine.cross_right(&ab, Some((&cd, &ab)));
        engine.cross_left(&ab, &[]);

        // No zero-level context is created this step, so the partial match
        // yields no candidate even though every other gate is open.
        let out = engine.cross_right(&c, None);
        assert_eq!(out.num_new_contexts, 0);
        assert!(out.candidates.is_empty());
        assert_eq!(out.num_selected, 1);
    }

    #[test]
    fn test_candidates_are_learned_as_non_zerolevel() {
        let mut engine = ContextCrosser::new(7);
        let candidate = CandidateContext::new(f(&[1, 2]), f(&[9]));

        let out = engine.cross_left(&[], &[candidate.clone()]);
        assert_eq!(out.num_new_contexts, 1);
        assert!(!engine.context(ContextId::from_raw(0)).is_zerolevel());

        // Learning the same pair again is a no-op.
        let out = engine.cross_left(&[], &[candidate]);
        assert_eq!(out.num_new_contexts, 0);
        assert_eq!(engine.num_contexts(), 1);
    }

    #[test]
    fn test_proposal_upgrades_existing_pair_to_zerolevel() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let x = f(&[9]);

        engine.cross_left(&[], &[CandidateContext::new(ab.clone(), x.clone())]);
        assert!(!engine.context(ContextId::from_raw(0)).is_zerolevel());

        let out = engine.cross_right(&x, Some((&ab, &x)));
        assert_eq!(out.num_new_contexts, 0);
        assert!(engine.context(ContextId::from_raw(0)).is_zerolevel());
    }

    #[test]
    fn test_prediction_unions_zero_weight_ties() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);

        engine.cross_left(
            &[],
            &[
                CandidateContext::new(ab.clone(), f(&[10])),
                CandidateContext::new(ab.clone(), f(&[11])),
            ],
        );

        // Both pairings have zero weight; the forecast keeps the tie.
        let out = engine.cross_left(&ab, &[]);
        assert_eq!(out.prediction, f(&[10, 11]));
    }

    #[test]
    fn test_prediction_follows_maximum_weight() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);

        // Learn {1,2} -> {3,4} and confirm it once so its weight is 1.0,
        // then attach a zero-weight rival to the same antecedent.
        engine.cross_right(&ab, None);
        engine.cross_left(&ab, &[]);
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[]);
        engine.cross_right(&ab, Some((&cd, &ab)));
        engine.cross_left(&ab, &[]);
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[CandidateContext::new(ab.clone(), f(&[99]))]);

        let out = engine.cross_left(&ab, &[]);
        assert_eq!(out.prediction, f(&[3, 4]));
    }

    #[test]
    fn test_duplicate_candidates_are_emitted_once() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);
        let cde = f(&[3, 4, 5]);
        let c = f(&[3]);

        // Two zero-level pairings share the antecedent {1,2}: consequents
        // {3,4} and {3,4,5}.
        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[CandidateContext::new(ab.clone(), cde.clone())]);
        engine.cross_right(&cde, Some((&ab, &cde)));
        engine.cross_left(&ab, &[]);

        // Under the input {3} both consequents are observed as exactly {3},
        // so both pairings capture the same (ab, {3}) candidate; the outcome
        // keeps one copy.
        let out = engine.cross_right(&c, Some((&ab, &c)));
        assert_eq!(out.num_new_contexts, 1);
        assert_eq!(out.num_selected, 2);
        assert_eq!(out.candidates, vec![CandidateContext::new(ab.clone(), c.clone())]);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut engine = ContextCrosser::new(7);
        let ab = f(&[1, 2]);
        let cd = f(&[3, 4]);

        engine.cross_right(&cd, Some((&ab, &cd)));
        engine.cross_left(&cd, &[]);
        assert_eq!(engine.num_contexts(), 1);

        engine.clear();
        assert_eq!(engine.num_contexts(), 0);
        assert!(engine.left().is_empty());
        assert!(engine.right().is_empty());
        assert_eq!(engine.max_left_len(), 7);

        let out = engine.cross_left(&cd, &[]);
        assert!(out.prediction.is_empty());
    }

    #[test]
    fn test_memory_usage_grows_with_learning() {
        let mut engine = ContextCrosser::new(7);
        let empty = engine.memory_usage();

        let mut prev = f(&[0, 1]);
        for i in 1..40u32 {
            let curr = f(&[2 * i, 2 * i + 1]);
            engine.cross_right(&curr, Some((&prev, &curr)));
            engine.cross_left(&curr, &[]);
            prev = curr;
        }
        assert!(engine.memory_usage() > empty);
    }
}
