//! HLL-Druid: a fixed-geometry HLL engine, byte-for-byte wire compatible
//! with Apache Druid's `HLLSketch`.
//!
//! Unlike HLL-Classic, precision is not configurable: 2048 four-bit
//! registers packed two-per-byte, with a sliding "register offset" window
//! and a single overflow slot standing in for the rare register that would
//! otherwise overflow its 4-bit budget.
//!
//! # References
//!
//! - Apache Druid's `HyperLogLogCollector` (the wire format this engine
//!   reproduces byte-for-byte).
//! - Flajolet et al. "HyperLogLog: the analysis of a near-optimal
//!   cardinality estimation algorithm" (2007), for the underlying
//!   estimator this engine's fixed p=11 geometry specializes.

use crate::common::hash::hash128;
use crate::common::SketchError;

/// Number of registers, fixed at 2^11.
pub const NUM_BUCKETS: usize = 1 << 11;
/// Registers packed two-per-byte.
pub const NUM_BYTES_FOR_BUCKETS: usize = NUM_BUCKETS / 2;
/// Header size in bytes.
pub const NUM_HEADER_BYTES: usize = 7;
/// Total dense wire size: header + dense payload.
pub const DENSE_BUFFER_SIZE: usize = NUM_HEADER_BYTES + NUM_BYTES_FOR_BUCKETS;
/// Below this many non-zero registers, serialization prefers sparse.
pub const DENSE_THRESHOLD: u16 = 128;

const BUCKET_MASK: u16 = 0x7ff;
const BITS_PER_BUCKET: u8 = 4;
const RANGE: u8 = (1 << BITS_PER_BUCKET) - 1; // 15

const ALPHA: f64 = 0.7213 / (1.0 + 1.079 / NUM_BUCKETS as f64);
const LOW_CORRECTION_THRESHOLD: f64 = (5 * NUM_BUCKETS) as f64 / 2.0;
const TWO_TO_THE_SIXTY_FOUR: f64 = 18_446_744_073_709_551_616.0;
const HIGH_CORRECTION_THRESHOLD: f64 = TWO_TO_THE_SIXTY_FOUR / 30.0;
const CORRECTION_PARAMETER: f64 = ALPHA * (NUM_BUCKETS * NUM_BUCKETS) as f64;

/// A Druid synopsis: owns its 1031-byte wire buffer directly.
///
/// Both sparse and dense wire inputs can be folded in, but the engine's
/// live state is always dense.
#[derive(Debug, Clone)]
pub struct HllDruid {
    buffer: Vec<u8>,
}

impl HllDruid {
    /// Allocates a fresh, zeroed 1031-byte synopsis (version = 1).
    pub fn with_owned_buffer() -> Self {
        let mut druid = Self {
            buffer: vec![0u8; DENSE_BUFFER_SIZE],
        };
        druid.reset();
        druid
    }

    /// Wraps an existing 1031-byte dense buffer.
    ///
    /// # Errors
    /// `SerializationError` if `buffer` isn't exactly [`DENSE_BUFFER_SIZE`]
    /// bytes long.
    pub fn wrap_raw_buffer(buffer: Vec<u8>) -> Result<Self, SketchError> {
        if buffer.len() != DENSE_BUFFER_SIZE {
            return Err(SketchError::SerializationError(format!(
                "buffer is not {} bytes",
                DENSE_BUFFER_SIZE
            )));
        }
        Ok(Self { buffer })
    }

    /// Zeroes the buffer and writes version = 1.
    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|b| *b = 0);
        self.buffer[0] = 1;
    }

    /// The header version byte. Always 1 for a freshly-reset synopsis.
    pub fn version(&self) -> u8 {
        self.buffer[0]
    }

    fn register_offset(&self) -> u8 {
        self.buffer[1]
    }

    fn set_register_offset(&mut self, offset: u8) {
        self.buffer[1] = offset;
    }

    fn num_nonzero_registers(&self) -> u16 {
        u16::from_be_bytes([self.buffer[2], self.buffer[3]])
    }

    fn set_num_nonzero_registers(&mut self, n: u16) {
        self.buffer[2..4].copy_from_slice(&n.to_be_bytes());
    }

    fn max_overflow_value(&self) -> u8 {
        self.buffer[4]
    }

    fn set_max_overflow_value(&mut self, v: u8) {
        self.buffer[4] = v;
    }

    fn max_overflow_register(&self) -> u16 {
        u16::from_be_bytes([self.buffer[5], self.buffer[6]])
    }

    fn set_max_overflow_register(&mut self, r: u16) {
        self.buffer[5..7].copy_from_slice(&r.to_be_bytes());
    }

    fn is_sparse_length(len: usize) -> bool {
        len != DENSE_BUFFER_SIZE
    }

    /// Hashes `value`'s string representation with MurmurHash3 x64 128-bit
    /// (seed 0), matching Druid's own scalar ingestion path, and adds it.
    pub fn add<T: std::fmt::Display>(&mut self, value: T) {
        let s = value.to_string();
        let digest = hash128(s.as_bytes());
        self.add_hashed(&digest);
    }

    /// Routes a 128-bit hash directly into the synopsis (§3.3, §4.7).
    pub fn add_hashed(&mut self, hash: &[u8; 16]) {
        let bucket = u16::from_be_bytes([hash[14], hash[15]]) & BUCKET_MASK;

        let mut position: u8 = 0;
        for &byte in &hash[0..8] {
            let lookup = super::bias::POSITION_OF_1_LOOKUP[byte as usize];
            if lookup == 0 {
                position += 8;
            } else {
                position += lookup;
                break;
            }
        }

        self.add_register(bucket, position);
    }

    /// §4.7.1's `add_register` contract: overflow eviction, nibble write,
    /// and the 2048-nonzero rollover that advances `registerOffset`.
    fn add_register(&mut self, bucket: u16, position_of_1: u8) {
        let offset = self.register_offset();

        if position_of_1 <= offset {
            return;
        }
        if position_of_1 > offset.saturating_add(RANGE) {
            let curr_max = self.max_overflow_value();
            if position_of_1 > curr_max {
                if curr_max <= offset.saturating_add(RANGE) && curr_max != 0 {
                    let overflow_bucket = self.max_overflow_register();
                    self.add_register(overflow_bucket, curr_max);
                }
                self.set_max_overflow_value(position_of_1);
                self.set_max_overflow_register(bucket);
            }
            return;
        }

        let num_nonzero = self.add_nibble_register(bucket, position_of_1 - offset);
        self.set_num_nonzero_registers(num_nonzero);

        if num_nonzero as usize == NUM_BUCKETS {
            self.set_register_offset(offset + 1);
            let new_num_zero = self.decrement_buckets();
            self.set_num_nonzero_registers(new_num_zero);
        }
    }

    fn payload_position(bucket: u16) -> usize {
        NUM_HEADER_BYTES + (bucket >> 1) as usize
    }

    fn add_nibble_register(&mut self, bucket: u16, shifted_position: u8) -> u16 {
        let mut num_nonzero = self.num_nonzero_registers();
        let position = Self::payload_position(bucket);
        let is_upper = bucket & 0x1 == 0;

        let shifted = if is_upper {
            shifted_position << BITS_PER_BUCKET
        } else {
            shifted_position
        };

        let orig = self.buffer[position];
        let new_mask: u8 = if is_upper { 0xf0 } else { 0x0f };
        let orig_mask = !new_mask;

        if (orig & new_mask) == 0 && shifted != 0 {
            num_nonzero += 1;
        }

        let left = orig & new_mask;
        let right = shifted;
        self.buffer[position] = (left.max(right)) | (orig & orig_mask);

        num_nonzero
    }

    /// Decrements every nibble in the payload by one, saturating at zero,
    /// and returns the new non-zero count.
    fn decrement_buckets(&mut self) -> u16 {
        let mut count: u16 = 0;
        for i in NUM_HEADER_BYTES..NUM_HEADER_BYTES + NUM_BYTES_FOR_BUCKETS {
            let mut val = self.buffer[i];
            if val & 0xf0 != 0 {
                val -= 0x10;
            }
            if val & 0x0f != 0 {
                val -= 0x01;
            }
            if val & 0xf0 != 0 {
                count += 1;
            }
            if val & 0x0f != 0 {
                count += 1;
            }
            self.buffer[i] = val;
        }
        count
    }

    /// Folds another wire-format payload (sparse or dense, auto-detected
    /// by length) into this synopsis (§4.7.1b).
    pub fn fold(&mut self, other: &[u8]) -> Result<(), SketchError> {
        if other.len() < NUM_HEADER_BYTES {
            return Err(SketchError::SerializationError(
                "payload too short to contain the Druid header".to_string(),
            ));
        }
        let other_offset = other[1];
        let other_max_overflow_value = other[4];
        let other_max_overflow_register = u16::from_be_bytes([other[5], other[6]]);

        while self.register_offset() < other_offset {
            self.set_register_offset(self.register_offset() + 1);
            let new_num_zero = self.decrement_buckets();
            self.set_num_nonzero_registers(new_num_zero);
        }

        let offset_diff = self.register_offset() - other_offset;
        let mut num_nonzero = self.num_nonzero_registers();

        if Self::is_sparse_length(other.len()) {
            num_nonzero += merge_sparse(&mut self.buffer, other, offset_diff)?;
        } else {
            num_nonzero += merge_dense(&mut self.buffer, other, offset_diff);
        }

        if num_nonzero as usize == NUM_BUCKETS {
            num_nonzero = self.decrement_buckets();
            self.set_register_offset(self.register_offset() + 1);
        }
        self.set_num_nonzero_registers(num_nonzero);

        self.add_register(other_max_overflow_register, other_max_overflow_value);
        Ok(())
    }

    /// Total size `serialize` would produce: sparse (`7 + 3k`) when the
    /// non-zero count is below [`DENSE_THRESHOLD`], else dense (1031).
    pub fn serialized_size(&self) -> usize {
        if self.num_nonzero_registers() < DENSE_THRESHOLD {
            let mut len = NUM_HEADER_BYTES;
            for i in 0..NUM_BYTES_FOR_BUCKETS {
                if self.buffer[i + NUM_HEADER_BYTES] != 0 {
                    len += 3;
                }
            }
            len
        } else {
            DENSE_BUFFER_SIZE
        }
    }

    /// Serializes the synopsis into `out`, which must be at least
    /// [`Self::serialized_size`] bytes long. Chooses sparse or dense
    /// automatically based on non-zero register density.
    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.clear();
        if self.num_nonzero_registers() < DENSE_THRESHOLD {
            out.extend_from_slice(&self.buffer[0..NUM_HEADER_BYTES]);
            for i in 0..NUM_BYTES_FOR_BUCKETS {
                let byte = self.buffer[i + NUM_HEADER_BYTES];
                if byte != 0 {
                    let position = (i + NUM_HEADER_BYTES) as u16;
                    out.extend_from_slice(&position.to_be_bytes());
                    out.push(byte);
                }
            }
        } else {
            out.extend_from_slice(&self.buffer);
        }
    }

    /// The estimator of §4.7.2: dense-register harmonic sum plus the
    /// overflow slot's contribution, then linear-counting / raw /
    /// large-range correction.
    ///
    /// Returns `-1.0` as the overflow sentinel when the raw estimate
    /// would exceed `2^64`.
    pub fn approximate_count_distinct(&self) -> f64 {
        let offset = self.register_offset();
        let overflow_value = self.max_overflow_value();
        let overflow_register = self.max_overflow_register();
        let overflow_position = (overflow_register / 2) as usize;
        let is_upper_nibble = overflow_register & 0x1 == 0;

        let mut e = 0.0f64;
        let mut zero_count: u16 = 0;

        for position in 0..NUM_BYTES_FOR_BUCKETS {
            let register_value = self.buffer[NUM_HEADER_BYTES + position];
            if overflow_value != 0 && position == overflow_position {
                let mut upper = ((register_value & 0xf0) >> BITS_PER_BUCKET) + offset;
                let mut lower = (register_value & 0x0f) + offset;
                if is_upper_nibble {
                    upper = upper.max(overflow_value);
                } else {
                    lower = lower.max(overflow_value);
                }
                e += 2f64.powi(-(upper as i32)) + 2f64.powi(-(lower as i32));
                // zero_count tracks whether the *stored* nibble is empty, not
                // whether the post-offset/overflow position value is; testing
                // `upper`/`lower` here (absolute positions, not nibbles) would
                // miscount any small nonzero register as empty.
                zero_count += num_zero_contribution(register_value);
            } else {
                e += min_num_register_contribution(offset, register_value);
                zero_count += num_zero_contribution(register_value);
            }
        }

        apply_correction(e, zero_count)
    }
}

impl crate::common::Sketch for HllDruid {
    type Item = String;

    fn update(&mut self, item: &Self::Item) {
        self.add(item);
    }

    fn estimate(&self) -> f64 {
        self.approximate_count_distinct()
    }

    fn is_empty(&self) -> bool {
        self.num_nonzero_registers() == 0 && self.max_overflow_value() == 0
    }
}

impl crate::common::Mergeable for HllDruid {
    /// Serializes `other` and folds it in, since Druid's native merge
    /// operation is defined over the wire format rather than two live
    /// synopses directly.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        let mut buf = Vec::new();
        other.serialize(&mut buf);
        self.fold(&buf)
    }
}

/// Dense-path per-byte harmonic-sum contribution at the given register
/// offset, equivalent to Druid's precomputed `minNumRegisterLookup`.
fn min_num_register_contribution(offset: u8, byte: u8) -> f64 {
    let upper = (byte >> BITS_PER_BUCKET) as u32 + offset as u32;
    let lower = (byte & 0x0f) as u32 + offset as u32;
    2f64.powi(-(upper as i32)) + 2f64.powi(-(lower as i32))
}

/// Dense-path per-byte zero-nibble count, equivalent to Druid's
/// precomputed `numZeroLookup`.
fn num_zero_contribution(byte: u8) -> u16 {
    u16::from(byte & 0xf0 == 0) + u16::from(byte & 0x0f == 0)
}

fn apply_correction(e: f64, zero_count: u16) -> f64 {
    if e == 0.0 {
        return 0.0;
    }
    let e = CORRECTION_PARAMETER / e;

    if e <= LOW_CORRECTION_THRESHOLD {
        return if zero_count == 0 {
            e
        } else {
            NUM_BUCKETS as f64 * (NUM_BUCKETS as f64 / zero_count as f64).ln()
        };
    }

    if e > HIGH_CORRECTION_THRESHOLD {
        let ratio = e / TWO_TO_THE_SIXTY_FOUR;
        return if ratio >= 1.0 {
            -1.0
        } else {
            -TWO_TO_THE_SIXTY_FOUR * (1.0 - ratio).ln()
        };
    }

    e
}

fn merge_byte(payload: &mut [u8], position: usize, byte_to_add: u8, offset_diff: u8) -> u16 {
    let upper_nibble = payload[position] & 0xf0;
    let lower_nibble = payload[position] & 0x0f;

    let shift = (offset_diff as i32) << BITS_PER_BUCKET;
    let other_upper = if byte_to_add > 0 {
        (byte_to_add & 0xf0) as i32 - shift
    } else {
        0
    };
    let other_lower = if byte_to_add > 0 {
        (byte_to_add & 0x0f) as i32 - offset_diff as i32
    } else {
        0
    };

    let new_upper = (upper_nibble as i32).max(other_upper);
    let new_lower = (lower_nibble as i32).max(other_lower);

    payload[position] = ((new_upper | new_lower) & 0xff) as u8;

    u16::from(upper_nibble == 0 && new_upper > 0) + u16::from(lower_nibble == 0 && new_lower > 0)
}

fn merge_dense(payload: &mut [u8], other: &[u8], offset_diff: u8) -> u16 {
    let mut num_nonzero = 0u16;
    for position in NUM_HEADER_BYTES..NUM_HEADER_BYTES + NUM_BYTES_FOR_BUCKETS {
        let byte_to_add = other[position];
        num_nonzero += merge_byte(payload, position, byte_to_add, offset_diff);
    }
    num_nonzero
}

/// `register_position` is already payload-relative (header size subtracted),
/// so its valid range is `0..NUM_BYTES_FOR_BUCKETS`; rejects anything
/// outside it before it reaches `merge_byte`'s indexing.
fn merge_sparse(payload: &mut [u8], other: &[u8], offset_diff: u8) -> Result<u16, SketchError> {
    let mut num_nonzero = 0u16;
    let mut position = NUM_HEADER_BYTES;
    while position + 3 <= other.len() {
        let register_position =
            u16::from_be_bytes([other[position], other[position + 1]]) as i32 - NUM_HEADER_BYTES as i32;
        let byte_to_add = other[position + 2];

        if byte_to_add != 0 {
            if register_position < 0 || register_position as usize >= NUM_BYTES_FOR_BUCKETS {
                return Err(SketchError::SerializationError(format!(
                    "invalid sparse payload position: {}",
                    register_position
                )));
            }
            num_nonzero += merge_byte(
                payload,
                register_position as usize + NUM_HEADER_BYTES,
                byte_to_add,
                offset_diff,
            );
        }
        position += 3;
    }
    Ok(num_nonzero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_synopsis_estimates_zero() {
        let druid = HllDruid::with_owned_buffer();
        assert_eq!(druid.approximate_count_distinct(), 0.0);
    }

    #[test]
    fn test_wrap_raw_buffer_rejects_wrong_length() {
        assert!(HllDruid::wrap_raw_buffer(vec![0u8; 10]).is_err());
        assert!(HllDruid::wrap_raw_buffer(vec![0u8; DENSE_BUFFER_SIZE]).is_ok());
    }

    #[test]
    fn test_add_single_scalar_estimates_one() {
        let mut druid = HllDruid::with_owned_buffer();
        druid.add(42);
        let estimate = druid.approximate_count_distinct();
        assert!((estimate - 1.0).abs() < 0.5, "estimate = {}", estimate);
    }

    #[test]
    fn test_add_single_scalar_serializes_sparse() {
        let mut druid = HllDruid::with_owned_buffer();
        druid.add(42);
        let size = druid.serialized_size();
        assert_eq!(size, NUM_HEADER_BYTES + 3);
        let mut out = Vec::new();
        druid.serialize(&mut out);
        assert_eq!(out.len(), size);
    }

    #[test]
    fn test_fold_sparse_all_zero_header_is_noop() {
        let mut druid = HllDruid::with_owned_buffer();
        let zero_sparse = vec![0u8; NUM_HEADER_BYTES];
        druid.fold(&zero_sparse).unwrap();
        assert_eq!(druid.approximate_count_distinct(), 0.0);
    }

    #[test]
    fn test_merge_disjoint_synopses_sums_roughly() {
        let mut a = HllDruid::with_owned_buffer();
        for i in 0..1000 {
            a.add(i);
        }
        let mut b = HllDruid::with_owned_buffer();
        for i in 1000..2000 {
            b.add(i);
        }
        let mut serialized_b = Vec::new();
        b.serialize(&mut serialized_b);
        a.fold(&serialized_b).unwrap();

        let estimate = a.approximate_count_distinct();
        assert!(
            (1900.0..=2100.0).contains(&estimate),
            "estimate = {}",
            estimate
        );
    }

    #[test]
    fn test_reset_clears_state() {
        let mut druid = HllDruid::with_owned_buffer();
        druid.add(1);
        druid.reset();
        assert_eq!(druid.approximate_count_distinct(), 0.0);
        assert_eq!(druid.version(), 1);
    }

    #[test]
    fn test_accuracy_within_5_percent_at_100000() {
        let mut druid = HllDruid::with_owned_buffer();
        for i in 0..100_000u64 {
            druid.add(i);
        }
        let estimate = druid.approximate_count_distinct();
        let error = (estimate - 100_000.0).abs() / 100_000.0;
        assert!(error < 0.05, "error = {}", error);
    }
}
