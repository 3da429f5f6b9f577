//! Linear Counting: a bitmap-based estimator for calibrating near-zero
//! cardinalities, used standalone or as the small-range fallback inside
//! the HLL++ composite estimator.

use super::bias;
use crate::common::validation;
use crate::common::SketchError;

/// A `2^q`-bit bitmap counter.
#[derive(Debug, Clone)]
pub struct LinearCounting {
    q: u8,
    bits: Vec<u64>,
}

impl LinearCounting {
    /// Creates an empty bitmap of `2^q` bits. `q` is typically chosen as
    /// `p - 4` relative to a companion HLL precision `p`.
    ///
    /// # Errors
    /// `ConfigError` if `q` is zero or large enough to overflow a
    /// `usize`-addressable bit count.
    pub fn new(q: u8) -> Result<Self, SketchError> {
        if q == 0 || q > 32 {
            return Err(SketchError::ConfigError {
                param: "q".to_string(),
                value: q.to_string(),
                constraint: "1 <= q <= 32".to_string(),
            });
        }
        let num_bits = 1usize << q;
        let num_words = num_bits.div_ceil(64);
        Ok(Self {
            q,
            bits: vec![0u64; num_words],
        })
    }

    /// The `q` parameter this counter was constructed with.
    pub fn q(&self) -> u8 {
        self.q
    }

    /// Total number of bits in the bitmap, `2^q`.
    pub fn num_bits(&self) -> usize {
        1usize << self.q
    }

    /// Sets the bit selected by the top `q` bits of `hash`.
    pub fn add(&mut self, hash: u64) {
        let index = (hash >> (64 - self.q)) as usize;
        self.bits[index / 64] |= 1u64 << (index % 64);
    }

    /// Count of bits still unset.
    pub fn count_unset_bits(&self) -> usize {
        let total_set: u32 = self.bits.iter().map(|w| w.count_ones()).sum();
        self.num_bits() - total_set as usize
    }

    /// `2^q * ln(2^q / count_unset_bits())`. Returns `f64::INFINITY` if
    /// every bit is set (no unset bits to estimate from).
    pub fn estimate(&self) -> f64 {
        let unset = self.count_unset_bits();
        if unset == 0 {
            return f64::INFINITY;
        }
        let m = self.num_bits() as f64;
        m * (m / unset as f64).ln()
    }

    /// Zeroes the bitmap in place.
    pub fn reset(&mut self) {
        self.bits.iter_mut().for_each(|w| *w = 0);
    }
}

/// The HLL++ linear-counting cutoff for an HLL-Classic synopsis of the
/// given precision: if `LC(m, z) <= threshold(p)`, the composite
/// estimator prefers the linear-counting result over the raw/bias-corrected
/// estimate.
///
/// # Errors
/// `PrecisionOutOfRange` if `precision` is outside `[4, 18]`.
pub fn threshold(precision: u8) -> Result<u64, SketchError> {
    validation::validate_precision(precision)?;
    Ok(bias::linear_counting_threshold(precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_and_oversized_q() {
        assert!(LinearCounting::new(0).is_err());
        assert!(LinearCounting::new(33).is_err());
        assert!(LinearCounting::new(10).is_ok());
    }

    #[test]
    fn test_num_bits_matches_q() {
        let lc = LinearCounting::new(10).unwrap();
        assert_eq!(lc.num_bits(), 1024);
    }

    #[test]
    fn test_add_sets_expected_bit() {
        let mut lc = LinearCounting::new(4).unwrap();
        // Top 4 bits = 0b0101 = 5.
        let hash = 0b0101u64 << 60;
        lc.add(hash);
        assert_eq!(lc.count_unset_bits(), 15);
    }

    #[test]
    fn test_estimate_empty_is_zero() {
        let lc = LinearCounting::new(10).unwrap();
        assert_eq!(lc.estimate(), 0.0);
    }

    #[test]
    fn test_estimate_all_set_is_infinite() {
        let mut lc = LinearCounting::new(4).unwrap();
        for bucket in 0u64..16 {
            lc.add(bucket << 60);
        }
        assert!(lc.estimate().is_infinite());
    }

    #[test]
    fn test_estimate_matches_formula_for_half_set() {
        let mut lc = LinearCounting::new(4).unwrap();
        for bucket in 0u64..8 {
            lc.add(bucket << 60);
        }
        let expected = 16.0 * (16.0f64 / 8.0).ln();
        assert!((lc.estimate() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_bits() {
        let mut lc = LinearCounting::new(4).unwrap();
        lc.add(0);
        lc.reset();
        assert_eq!(lc.count_unset_bits(), 16);
    }

    #[test]
    fn test_threshold_rejects_out_of_range_precision() {
        assert!(threshold(3).is_err());
        assert!(threshold(19).is_err());
    }

    #[test]
    fn test_threshold_matches_bias_table() {
        assert_eq!(threshold(4).unwrap(), bias::linear_counting_threshold(4));
        assert_eq!(threshold(18).unwrap(), bias::linear_counting_threshold(18));
    }
}
