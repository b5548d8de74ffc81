//! Contexture - Contextual Anomaly Detection for Scalar Streams
//!
//! Contexture is a Rust library for online anomaly detection built on
//! **context crossing**: an incremental learner that pairs consecutive steps
//! of a discretized fact stream into antecedent/consequent contexts and
//! scores each new step by how well the learned population forecast it.
//!
//! # Key Characteristics
//!
//! - Fully online: learns and scores in a single pass, no training phase
//! - Incremental cost proportional to the step's active facts, not to the
//!   stored population
//! - Deterministic: identical streams produce identical ids, forecasts, and
//!   scores
//! - Self-referential feedback: activated contexts become facts of the next
//!   step, so patterns over patterns are learned with the same machinery
//!
//! # Architecture
//!
//! The library is built around four components:
//!
//! - **Fact**: Opaque discrete symbol; steps are sorted, deduplicated fact
//!   sets
//! - **Semi-Context Index**: Per-side arena with structural dedup and a
//!   fact-level reverse index
//! - **Context Crosser**: Two-phase step protocol that scores consequents,
//!   captures generalization candidates, and emits forecasts
//! - **Anomaly Detector**: Scalar quantization, neuron feedback, score
//!   shaping, and rest-period suppression around one crosser per stream
//!
//! # Examples
//!
//! ## Scoring a scalar stream
//!
//! ```
//! use contexture::{AnomalyDetector, DetectorConfig};
//!
//! let config = DetectorConfig::new(0.0, 100.0).with_rest_period(10);
//! let mut detector = AnomalyDetector::new(config).unwrap();
//!
//! // A periodic signal; every score is in [0, 1].
//! for i in 0..100u32 {
//!     let value = f64::from(i % 10) * 10.0;
//!     let score = detector.score(value);
//!     assert!((0.0..=1.0).contains(&score));
//! }
//! ```
//!
//! ## Driving the engine with raw facts
//!
//! ```
//! use contexture::{ContextCrosser, Fact};
//!
//! let mut engine = ContextCrosser::new(7);
//! let ab = vec![Fact::new(1), Fact::new(2)];
//! let cd = vec![Fact::new(3), Fact::new(4)];
//!
//! engine.cross_right(&ab, None);
//! engine.cross_left(&ab, &[]);
//! engine.cross_right(&cd, Some((&ab, &cd)));
//! engine.cross_left(&cd, &[]);
//! engine.cross_right(&ab, Some((&cd, &ab)));
//!
//! // The learned pairing forecasts {3, 4} after {1, 2}.
//! let out = engine.cross_left(&ab, &[]);
//! assert_eq!(out.prediction, cd);
//! ```
//!
//! # Determinism
//!
//! All iteration that reaches observable output runs in id or fact order,
//! and ids are assigned in first-seen order. Replaying a stream into a fresh
//! detector reproduces every forecast and score exactly.
//!
//! # Safety
//!
//! Contexture uses `debug_assert!` for input-contract checking in hot paths,
//! providing:
//!
//! - Zero-cost checking in release builds
//! - Full validation during development and testing
//! - Memory safety guaranteed by Rust's type system

// Module declarations
pub mod error;
pub mod fact;

// Engine
pub mod context;
pub mod crosser;
pub mod semi_context;

// Detector
pub mod config;
pub mod detector;
pub mod encoder;

// Re-exports for convenient access
pub use error::{ContextureError, Result};
pub use fact::Fact;

// Engine re-exports
pub use context::{ActiveContext, CandidateContext, Context, ContextId};
pub use crosser::{ContextCrosser, LeftCrossing, RightCrossing};
pub use semi_context::{SemiContext, SemiContextId, SemiContextIndex};

// Detector re-exports
pub use config::DetectorConfig;
pub use detector::{AnomalyDetector, StepResult, NEURON_FACT_BASE};
pub use encoder::{ScalarEncoder, SENSOR_FACT_BASE};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "Contexture";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}
