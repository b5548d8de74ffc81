//! Scalar encoder - quantizes sensor readings into bit-coded facts.
//!
//! A reading is clamped to the configured range, quantized into one of
//! `2^num_bits` bins, and emitted as exactly `num_bits` facts: one per bit
//! position, encoding that position's bit value. Position `k` with bit `b`
//! becomes fact `SENSOR_FACT_BASE + 2k + b`, so every position always
//! contributes a fact and two readings differ only in the positions where
//! their bins differ.
//!
//! The same encoding drives the surprise measure: an unforecast fact at
//! position `k` contributes `2^(k + b/2)`, weighting disagreement in high
//! bits far more than in low bits.

use crate::fact::Fact;

/// Raw value of the first sensor fact. Sensor facts occupy
/// `SENSOR_FACT_BASE + 2k + b` for bit position `k` and bit value `b`.
pub const SENSOR_FACT_BASE: u32 = 1 << 16;

/// Quantizing encoder from scalar readings to fact sets.
///
/// # Examples
///
/// ```
/// use contexture::encoder::{ScalarEncoder, SENSOR_FACT_BASE};
///
/// let encoder = ScalarEncoder::new(0.0, 7.0, 3);
/// assert_eq!(encoder.bin(0.0), 0);
/// assert_eq!(encoder.bin(7.0), 7);
///
/// // Bin 5 = 0b101: positions 0 and 2 carry a one bit.
/// let facts: Vec<u32> = encoder.encode(5.0).iter().map(|f| f.raw()).collect();
/// assert_eq!(facts, vec![
///     SENSOR_FACT_BASE + 1,
///     SENSOR_FACT_BASE + 2,
///     SENSOR_FACT_BASE + 5,
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct ScalarEncoder {
    // Parameters
    min_value: f64,
    max_value: f64,
    num_bits: u32,

    // Derived
    max_bin: f64,
    step: f64,
}

impl ScalarEncoder {
    /// Create an encoder for readings in `[min_value, max_value]`.
    ///
    /// # Arguments
    ///
    /// * `min_value` - lowest expected reading (finite).
    /// * `max_value` - highest expected reading (finite, >= `min_value`).
    /// * `num_bits` - bits per bin index, in `1..=16`.
    pub fn new(min_value: f64, max_value: f64, num_bits: u32) -> Self {
        assert!(min_value.is_finite(), "min_value must be finite");
        assert!(max_value.is_finite(), "max_value must be finite");
        assert!(max_value >= min_value, "max_value must be >= min_value");
        assert!(
            (1..=16).contains(&num_bits),
            "num_bits must be in range [1, 16]"
        );

        let max_bin = ((1u32 << num_bits) - 1) as f64;
        let mut range = max_value - min_value;
        if range == 0.0 {
            range = max_bin;
        }

        Self {
            min_value,
            max_value,
            num_bits,
            max_bin,
            step: range / max_bin,
        }
    }

    /// Quantize a reading into its bin index in `[0, 2^num_bits - 1]`.
    ///
    /// Out-of-range readings clamp to the nearest bound; NaN quantizes to
    /// the lowest bin.
    pub fn bin(&self, value: f64) -> u32 {
        let clamped = value.clamp(self.min_value, self.max_value);
        let bin = ((clamped - self.min_value) / self.step) as u32;
        bin.min(self.max_bin as u32)
    }

    /// Encode a reading as one fact per bit position, ascending.
    pub fn encode(&self, value: f64) -> Vec<Fact> {
        let bin = self.bin(value);
        (0..self.num_bits)
            .map(|k| Fact::new(SENSOR_FACT_BASE + 2 * k + ((bin >> k) & 1)))
            .collect()
    }

    /// Surprise mass of the sensor facts absent from the forecast.
    ///
    /// Each unforecast fact contributes `2^((raw - SENSOR_FACT_BASE) / 2)`;
    /// the sum is scaled by the bin count so a completely unforecast
    /// lowest-bin reading scores exactly 1.0. `predicted` must be ascending.
    pub fn prediction_error(&self, facts: &[Fact], predicted: &[Fact]) -> f64 {
        let mut error = 0.0;
        for &fact in facts {
            if predicted.binary_search(&fact).is_err() {
                error += 2.0_f64.powf(f64::from(fact.raw() - SENSOR_FACT_BASE) / 2.0);
            }
        }
        error / self.max_bin
    }

    /// Lowest expected reading.
    #[inline]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Highest expected reading.
    #[inline]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Bits per bin index; also the number of facts per encoding.
    #[inline]
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }
}
