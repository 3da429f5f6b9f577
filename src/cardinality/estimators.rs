//! Cardinality estimators for the HLL-Classic register array

use super::bias;

/// Alpha_m bias-correction constant for `m` registers.
pub fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

/// Raw HLL estimate: `alpha(m) * m^2 / sum(2^-reg[i])`.
pub fn raw_estimate(registers: &[u8]) -> f64 {
    let m = registers.len();
    let sum: f64 = registers.iter().map(|&r| 2f64.powi(-(r as i32))).sum();
    alpha(m) * (m * m) as f64 / sum
}

/// Number of zero-valued registers.
pub fn count_zeros(registers: &[u8]) -> usize {
    registers.iter().filter(|&&r| r == 0).count()
}

/// Linear counting estimate `m * ln(m / z)` where `z` is the zero count.
pub fn linear_counting(m: usize, zeros: usize) -> f64 {
    m as f64 * ((m as f64) / (zeros as f64)).ln()
}

/// Applies the bias correction to raw estimate `e` if `e <= 5m`, else
/// returns `e` unchanged.
///
/// The published HLL++ estimator interpolates this correction from an
/// empirical table measured by Monte Carlo simulation against the true
/// cardinality. Those measured tables ship with neither the original source
/// tree this port is grounded on nor any other reference available here, so
/// this delegates to [`beta_estimate`] instead: LogLog-Beta corrects the
/// same small-range bias from a closed-form polynomial fit (coefficients
/// taken verbatim from the reference implementation, see [`bias::BETA_COEFFS`])
/// rather than a nearest-neighbor table lookup. See `DESIGN.md` for the
/// open-question writeup.
pub fn bias_corrected_estimate(e: f64, registers: &[u8], precision: u8) -> f64 {
    let m = registers.len();
    if e <= 5.0 * m as f64 {
        beta_estimate(registers, precision)
    } else {
        e
    }
}

/// The composite HLL++ estimator (`approximate_count_distinct`):
/// 1. Compute the raw estimate E.
/// 2. Bias-correct it if `E <= 5m`.
/// 3. If linear counting undercuts the precision-specific threshold, use
///    linear counting instead.
pub fn composite_estimate(registers: &[u8], precision: u8) -> f64 {
    let m = registers.len();
    let e = raw_estimate(registers);
    let ee = bias_corrected_estimate(e, registers, precision);

    let zeros = count_zeros(registers);
    let lc_threshold = bias::linear_counting_threshold(precision) as f64;

    let h = if zeros != 0 {
        linear_counting(m, zeros)
    } else {
        ee
    };

    if h <= lc_threshold {
        h
    } else {
        ee
    }
}

/// LogLog-Beta's polynomial correction `beta(z)`.
fn beta(z: usize, precision: u8) -> f64 {
    if z == 0 {
        return 0.0;
    }
    let coeffs = bias::beta_coeffs(precision);
    let zl = ((z + 1) as f64).ln();
    let mut result = coeffs[0] * z as f64;
    for (i, &c) in coeffs.iter().enumerate().skip(1) {
        result += zl.powi(i as i32) * c;
    }
    result
}

/// The LogLog-Beta estimator (`approximate_count_distinct_beta`).
pub fn beta_estimate(registers: &[u8], precision: u8) -> f64 {
    let m = registers.len();
    let zeros = count_zeros(registers);
    let sum: f64 = registers.iter().map(|&r| 2f64.powi(-(r as i32))).sum();
    let harmonic_mean = m as f64 / (sum + beta(zeros, precision));
    (alpha(m) * harmonic_mean * (m - zeros) as f64).round()
}
