//! Semi-context index - per-side storage and lookup for semi-contexts.
//!
//! A semi-context is one half of a learned pattern: the exact, immutable set
//! of facts defining either an antecedent (left side) or a consequent (right
//! side). The crossing engine owns two [`SemiContextIndex`] instances, one
//! per side. The index is pure storage and lookup; all cross-side logic lives
//! in the engine.
//!
//! # Architecture
//!
//! - **Arena** - semi-contexts live in a flat `Vec`, addressed by sequential
//!   [`SemiContextId`]s; records are referenced by id everywhere, never by
//!   pointer.
//! - **Dedup table** - maps the canonicalized defining fact sequence to its
//!   id. Keying by the sequence itself (not a precomputed hash) makes equal
//!   content the identity, so two distinct fact sets can never merge.
//! - **Reverse index** - maps each fact to every semi-context registered
//!   under it; this is what makes a step proportional to the active input,
//!   not to the stored population.
//! - **Crossed set** - the ids whose step-scoped active subset is non-empty,
//!   recomputed once per side per step.
//!
//! # Examples
//!
//! ```
//! use contexture::fact::Fact;
//! use contexture::semi_context::SemiContextIndex;
//!
//! let mut index = SemiContextIndex::new();
//! let id = index.register(&[Fact::new(1), Fact::new(2)]);
//!
//! // Registration is idempotent: the same defining set keeps the same id.
//! assert_eq!(index.register(&[Fact::new(1), Fact::new(2)]), id);
//! assert_eq!(index.len(), 1);
//!
//! // Match the current input against the stored population.
//! index.recompute_active(&[Fact::new(2), Fact::new(9)]);
//! assert_eq!(index.crossed(), &[id]);
//! assert!(!index.semi(id).is_fully_active()); // only 1 of 2 facts present
//! ```

use crate::context::ContextId;
use crate::fact::{is_normalized, Fact};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Identifier of a semi-context within one side's arena.
///
/// Ids are sequential per side; a left id and a right id with the same value
/// name unrelated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemiContextId(u32);

impl SemiContextId {
    #[inline]
    fn new(index: usize) -> Self {
        SemiContextId(index as u32)
    }

    /// Create a SemiContextId from a raw u32 value (for testing).
    #[doc(hidden)]
    pub fn from_raw(id: u32) -> Self {
        SemiContextId(id)
    }

    /// Get the raw value as an array index.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// One stored semi-context.
///
/// The defining set is fixed at registration; only its size is kept here (the
/// set itself is the dedup table's key). The `active` subset is step-scoped
/// working state: the defining facts observed in the current input.
#[derive(Debug, Clone, Default)]
pub struct SemiContext {
    /// Facts from the defining set present in the current input
    active: Vec<Fact>,

    /// Size of the immutable defining set
    init_nfacts: usize,

    /// right-semi-context id -> context id, populated on left-side records
    /// only. Ordered so the engine's emission order is reproducible.
    pub(crate) ctx_by_rsemi: BTreeMap<SemiContextId, ContextId>,
}

impl SemiContext {
    fn new(init_nfacts: usize) -> Self {
        Self {
            active: Vec::new(),
            init_nfacts,
            ctx_by_rsemi: BTreeMap::new(),
        }
    }

    /// Size of the defining fact set.
    #[inline]
    pub fn init_nfacts(&self) -> usize {
        self.init_nfacts
    }

    /// Defining facts observed in the current input (ascending).
    #[inline]
    pub fn active(&self) -> &[Fact] {
        &self.active
    }

    /// True when every defining fact is present in the current input.
    #[inline]
    pub fn is_fully_active(&self) -> bool {
        self.active.len() == self.init_nfacts
    }

    /// Contexts reachable from this (left-side) semi-context, keyed by the
    /// right semi-context completing the pair. Empty on right-side records.
    #[inline]
    pub fn context_map(&self) -> &BTreeMap<SemiContextId, ContextId> {
        &self.ctx_by_rsemi
    }

    fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.active.capacity() * std::mem::size_of::<Fact>();
        bytes += self.ctx_by_rsemi.len()
            * std::mem::size_of::<(SemiContextId, ContextId)>();
        bytes
    }
}

/// Per-side semi-context storage: arena, dedup table, reverse index, and the
/// step-scoped crossed set.
#[derive(Debug, Clone, Default)]
pub struct SemiContextIndex {
    /// Arena of semi-context records
    semis: Vec<SemiContext>,

    /// Canonical defining sequence -> id (structural dedup)
    by_facts: HashMap<Box<[Fact]>, SemiContextId>,

    /// Fact -> semi-contexts registered under it
    fact_index: HashMap<Fact, Vec<SemiContextId>>,

    /// Ids with a non-empty active subset, ascending; rebuilt every step
    crossed: Vec<SemiContextId>,
}

impl SemiContextIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the semi-context with this exact defining set.
    ///
    /// Returns the existing id when an identical set was registered before;
    /// otherwise allocates the next sequential id, stores a record with an
    /// empty active subset, and registers it in the reverse index under every
    /// fact of the set. A record created mid-step stays out of `crossed`
    /// until the next [`recompute_active`](Self::recompute_active).
    ///
    /// `facts` must be non-empty, sorted, and duplicate-free.
    pub fn register(&mut self, facts: &[Fact]) -> SemiContextId {
        debug_assert!(!facts.is_empty(), "defining set must be non-empty");
        debug_assert!(is_normalized(facts), "defining set must be sorted and deduplicated");

        if let Some(&id) = self.by_facts.get(facts) {
            return id;
        }

        let id = SemiContextId::new(self.semis.len());
        self.by_facts.insert(facts.into(), id);
        self.semis.push(SemiContext::new(facts.len()));
        for &fact in facts {
            self.fact_index.entry(fact).or_default().push(id);
        }
        id
    }

    /// Recompute every active subset from the current input facts.
    ///
    /// Clears the active subset of each previously crossed semi-context,
    /// appends each input fact to the active subset of every semi-context
    /// registered under it, and rebuilds the crossed set (ascending id
    /// order). Must run once per side per step before any matching logic
    /// reads active subsets.
    ///
    /// Runs in O(input facts x average semi-contexts per fact).
    pub fn recompute_active(&mut self, facts: &[Fact]) {
        debug_assert!(is_normalized(facts), "input facts must be sorted and deduplicated");

        for &id in &self.crossed {
            self.semis[id.as_usize()].active.clear();
        }

        let mut touched = Vec::new();
        for &fact in facts {
            if let Some(ids) = self.fact_index.get(&fact) {
                for &id in ids {
                    let semi = &mut self.semis[id.as_usize()];
                    if semi.active.is_empty() {
                        touched.push(id);
                    }
                    semi.active.push(fact);
                }
            }
        }

        touched.sort_unstable();
        self.crossed = touched;
    }

    /// Ids of semi-contexts with a non-empty active subset, ascending.
    #[inline]
    pub fn crossed(&self) -> &[SemiContextId] {
        &self.crossed
    }

    /// Get a semi-context by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not issued by this index.
    #[inline]
    pub fn semi(&self, id: SemiContextId) -> &SemiContext {
        &self.semis[id.as_usize()]
    }

    #[inline]
    pub(crate) fn semi_mut(&mut self, id: SemiContextId) -> &mut SemiContext {
        &mut self.semis[id.as_usize()]
    }

    /// Number of semi-contexts stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.semis.len()
    }

    /// True when nothing has been registered yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.semis.is_empty()
    }

    /// Number of distinct facts present in the reverse index.
    #[inline]
    pub fn num_indexed_facts(&self) -> usize {
        self.fact_index.len()
    }

    /// Semi-contexts registered under a fact (registration order).
    pub fn registered(&self, fact: Fact) -> &[SemiContextId] {
        self.fact_index.get(&fact).map_or(&[], Vec::as_slice)
    }

    /// Drop every stored semi-context and index entry.
    pub fn clear(&mut self) {
        self.semis.clear();
        self.by_facts.clear();
        self.fact_index.clear();
        self.crossed.clear();
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.semis.iter().map(SemiContext::memory_usage).sum::<usize>();
        for facts in self.by_facts.keys() {
            bytes += facts.len() * std::mem::size_of::<Fact>()
                + std::mem::size_of::<SemiContextId>();
        }
        for ids in self.fact_index.values() {
            bytes += std::mem::size_of::<Fact>()
                + ids.capacity() * std::mem::size_of::<SemiContextId>();
        }
        bytes += self.crossed.capacity() * std::mem::size_of::<SemiContextId>();
        bytes
    }
}
