//! Anomaly detector - stream orchestration around the crossing engine.
//!
//! The detector owns one [`ContextCrosser`] per value stream and drives it
//! step by step. Each reading is quantized into sensor facts, crossed
//! against the learned population, and scored by how surprising it was:
//!
//! - the quantized facts are compared against the previous forecast to get a
//!   bit-weighted prediction error;
//! - the engine's step diagnostics (fraction of selected contexts that
//!   activated, fraction of unique proposals that were learned) shape the
//!   raw score;
//! - the top activated contexts are fed back as synthetic facts on the next
//!   step, letting the engine learn patterns over its own activations.
//!
//! Raw scores are suppressed while any of the last `rest_period` of them
//! reached `base_threshold`, so one detected anomaly is reported once
//! instead of echoing for many steps. The history starts at 1.0, which keeps
//! the detector silent through its warm-up.
//!
//! # Examples
//!
//! ```
//! use contexture::config::DetectorConfig;
//! use contexture::detector::AnomalyDetector;
//!
//! let config = DetectorConfig::new(0.0, 100.0);
//! let mut detector = AnomalyDetector::new(config).unwrap();
//!
//! for _ in 0..10 {
//!     let score = detector.score(42.0);
//!     assert!((0.0..=1.0).contains(&score));
//! }
//! ```

use crate::config::DetectorConfig;
use crate::crosser::ContextCrosser;
use crate::encoder::ScalarEncoder;
use crate::error::Result;
use crate::fact::{normalize, Fact};
use std::collections::VecDeque;

/// Raw value of the first feedback fact: activated context `i` feeds back
/// into the next step's antecedent group as fact `NEURON_FACT_BASE + i`.
pub const NEURON_FACT_BASE: u32 = 1 << 31;

/// Outcome of one fact-level step.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    /// Forecast facts for the next step, ascending.
    pub prediction: Vec<Fact>,

    /// Fraction of selected contexts that fully activated this step; 0 when
    /// nothing was selected.
    pub pct_selected_active: f64,

    /// Fraction of this step's unique proposals that became contexts; 0
    /// unless a zero-level context was created this step.
    pub pct_added_to_unique: f64,
}

/// Contextual anomaly detector for a single scalar stream.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    // Parameters
    config: DetectorConfig,

    // Components
    encoder: ScalarEncoder,
    crosser: ContextCrosser,

    // State
    left_group: Vec<Fact>,
    last_prediction: Vec<Fact>,
    score_history: VecDeque<f64>,
}

impl AnomalyDetector {
    /// Create a detector from a validated configuration.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;

        let encoder = ScalarEncoder::new(config.min_value, config.max_value, config.num_norm_bits);
        let crosser = ContextCrosser::new(config.max_left_len);

        let mut score_history = VecDeque::with_capacity(config.rest_period + 1);
        score_history.push_back(1.0);

        Ok(Self {
            config,
            encoder,
            crosser,
            left_group: Vec::new(),
            last_prediction: Vec::new(),
            score_history,
        })
    }

    /// Advance the engine one step on an arbitrary fact set.
    ///
    /// Normalizes `input_facts`, proposes the previous step's fact group
    /// paired with them as a zero-level context, runs both crossing phases,
    /// and rebuilds the antecedent group from the current facts plus the
    /// top activated contexts (ranked by activation count, then id) encoded
    /// as feedback facts.
    pub fn step(&mut self, input_facts: &[Fact]) -> StepResult {
        let mut sens = input_facts.to_vec();
        normalize(&mut sens);

        let proposal = if !self.left_group.is_empty() && !sens.is_empty() {
            Some((std::mem::take(&mut self.left_group), sens.clone()))
        } else {
            None
        };

        let right = self.crosser.cross_right(
            &sens,
            proposal.as_ref().map(|(l, r)| (l.as_slice(), r.as_slice())),
        );
        let created = right.num_new_contexts > 0;

        // Unique proposals this step: the deduplicated candidates plus the
        // step pairing, unless a candidate already coincides with it.
        let mut num_unique = right.candidates.len();
        if let Some((left, facts)) = &proposal {
            let covered = right
                .candidates
                .iter()
                .any(|c| &c.left == left && &c.right == facts);
            if !covered {
                num_unique += 1;
            }
        }

        let pct_selected_active = if right.num_selected > 0 {
            right.active.len() as f64 / right.num_selected as f64
        } else {
            0.0
        };

        let mut active = right.active;
        active.sort_unstable_by_key(|a| (a.num_activations, a.ctx_id));
        let top = active.len().saturating_sub(self.config.max_active_neurons);

        let mut left_group = sens;
        left_group.extend(
            active[top..]
                .iter()
                .map(|a| Fact::new(NEURON_FACT_BASE + a.ctx_id.as_usize() as u32)),
        );
        normalize(&mut left_group);
        self.left_group = left_group;

        let left = self.crosser.cross_left(&self.left_group, &right.candidates);

        let num_new = left.num_new_contexts + right.num_new_contexts;
        let pct_added_to_unique = if created && num_unique > 0 {
            num_new as f64 / num_unique as f64
        } else {
            0.0
        };

        StepResult {
            prediction: left.prediction,
            pct_selected_active,
            pct_added_to_unique,
        }
    }

    /// Score one reading; returns the reported anomaly score in `[0, 1]`.
    ///
    /// The raw score is `(1 - pct_selected_active + pct_added_to_unique) / 2`
    /// when any quantized fact was unforecast, and 0 on a fully forecast
    /// reading. The reported score equals the raw score unless the rest
    /// period is armed, in which case 0 is reported while the raw score
    /// still enters the history.
    pub fn score(&mut self, value: f64) -> f64 {
        let sens = self.encoder.encode(value);
        let prediction_error = self.encoder.prediction_error(&sens, &self.last_prediction);

        let result = self.step(&sens);
        self.last_prediction = result.prediction;

        let raw = if prediction_error > 0.0 {
            (1.0 - result.pct_selected_active + result.pct_added_to_unique) / 2.0
        } else {
            0.0
        };

        let reported = if self.recent_peak() < self.config.base_threshold {
            raw
        } else {
            0.0
        };

        self.score_history.push_back(raw);
        while self.score_history.len() > self.config.rest_period {
            self.score_history.pop_front();
        }

        reported
    }

    /// Highest raw score among the retained history.
    fn recent_peak(&self) -> f64 {
        self.score_history.iter().copied().fold(0.0, f64::max)
    }

    /// Detector parameters.
    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The quantizing encoder.
    #[inline]
    pub fn encoder(&self) -> &ScalarEncoder {
        &self.encoder
    }

    /// The underlying crossing engine.
    #[inline]
    pub fn engine(&self) -> &ContextCrosser {
        &self.crosser
    }

    /// Fact group that will serve as the next step's antecedent.
    #[inline]
    pub fn left_group(&self) -> &[Fact] {
        &self.left_group
    }

    /// Forecast produced by the last step, ascending.
    #[inline]
    pub fn last_prediction(&self) -> &[Fact] {
        &self.last_prediction
    }

    /// Forget everything learned and re-arm the warm-up.
    pub fn clear(&mut self) {
        self.crosser.clear();
        self.left_group.clear();
        self.last_prediction.clear();
        self.score_history.clear();
        self.score_history.push_back(1.0);
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.crosser.memory_usage();
        bytes += self.left_group.capacity() * std::mem::size_of::<Fact>();
        bytes += self.last_prediction.capacity() * std::mem::size_of::<Fact>();
        bytes += self.score_history.capacity() * std::mem::size_of::<f64>();
        bytes
    }
}
