//! Detector configuration.
//!
//! [`DetectorConfig`] captures every constructor parameter of the anomaly
//! detector. Only the value range is mandatory; the remaining knobs default
//! to values that work well on typical sensor streams and can be overridden
//! through the `with_*` builders or loaded from a JSON file.
//!
//! # Example
//!
//! ```
//! use contexture::config::DetectorConfig;
//!
//! let config = DetectorConfig::new(0.0, 100.0)
//!     .with_base_threshold(0.5)
//!     .with_rest_period(10);
//! config.validate().unwrap();
//!
//! let json = config.to_json().unwrap();
//! let restored = DetectorConfig::from_json(&json).unwrap();
//! assert_eq!(config, restored);
//! ```

use crate::error::{ContextureError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_base_threshold() -> f64 {
    0.75
}

fn default_rest_period() -> usize {
    30
}

fn default_max_left_len() -> usize {
    7
}

fn default_max_active_neurons() -> usize {
    15
}

fn default_num_norm_bits() -> u32 {
    3
}

/// Anomaly detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Lowest expected reading.
    pub min_value: f64,

    /// Highest expected reading.
    pub max_value: f64,

    /// Score level that arms the rest period: while any of the last
    /// `rest_period` raw scores reaches it, reported scores are held at 0.
    #[serde(default = "default_base_threshold")]
    pub base_threshold: f64,

    /// Number of recent raw scores consulted for suppression.
    #[serde(default = "default_rest_period")]
    pub rest_period: usize,

    /// Longest left active subset eligible for generalization.
    #[serde(default = "default_max_left_len")]
    pub max_left_len: usize,

    /// Activated contexts fed back as facts on the next step, keeping the
    /// top entries by activation count.
    #[serde(default = "default_max_active_neurons")]
    pub max_active_neurons: usize,

    /// Bits per quantized reading; also the number of sensor facts per step.
    #[serde(default = "default_num_norm_bits")]
    pub num_norm_bits: u32,
}

impl DetectorConfig {
    /// Create a configuration with default knobs for readings in
    /// `[min_value, max_value]`.
    pub fn new(min_value: f64, max_value: f64) -> Self {
        Self {
            min_value,
            max_value,
            base_threshold: default_base_threshold(),
            rest_period: default_rest_period(),
            max_left_len: default_max_left_len(),
            max_active_neurons: default_max_active_neurons(),
            num_norm_bits: default_num_norm_bits(),
        }
    }

    /// Set the suppression threshold.
    pub fn with_base_threshold(mut self, base_threshold: f64) -> Self {
        self.base_threshold = base_threshold;
        self
    }

    /// Set the suppression window length.
    pub fn with_rest_period(mut self, rest_period: usize) -> Self {
        self.rest_period = rest_period;
        self
    }

    /// Set the generalization length limit.
    pub fn with_max_left_len(mut self, max_left_len: usize) -> Self {
        self.max_left_len = max_left_len;
        self
    }

    /// Set the feedback fan-out.
    pub fn with_max_active_neurons(mut self, max_active_neurons: usize) -> Self {
        self.max_active_neurons = max_active_neurons;
        self
    }

    /// Set the quantization width.
    pub fn with_num_norm_bits(mut self, num_norm_bits: u32) -> Self {
        self.num_norm_bits = num_norm_bits;
        self
    }

    /// Check every parameter, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            return Err(ContextureError::InvalidParameter(
                "min_value and max_value must be finite".to_string(),
            ));
        }
        if self.max_value < self.min_value {
            return Err(ContextureError::InvalidParameter(format!(
                "max_value ({}) must be >= min_value ({})",
                self.max_value, self.min_value
            )));
        }
        if !(self.base_threshold > 0.0 && self.base_threshold <= 1.0) {
            return Err(ContextureError::InvalidParameter(format!(
                "base_threshold ({}) must be in (0, 1]",
                self.base_threshold
            )));
        }
        if self.rest_period == 0 {
            return Err(ContextureError::InvalidParameter(
                "rest_period must be at least 1".to_string(),
            ));
        }
        if self.max_left_len == 0 {
            return Err(ContextureError::InvalidParameter(
                "max_left_len must be at least 1".to_string(),
            ));
        }
        if self.max_active_neurons == 0 {
            return Err(ContextureError::InvalidParameter(
                "max_active_neurons must be at least 1".to_string(),
            ));
        }
        if !(1..=16).contains(&self.num_norm_bits) {
            return Err(ContextureError::InvalidParameter(format!(
                "num_norm_bits ({}) must be in range [1, 16]",
                self.num_norm_bits
            )));
        }
        Ok(())
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
