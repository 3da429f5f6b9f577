//! HLL-Classic: header-prefixed HyperLogLog synopsis
//!
//! HyperLogLog (Flajolet et al. 2007) is the industry standard for
//! cardinality estimation, used by Redis, PostgreSQL, Druid, Spark,
//! ClickHouse, and many other systems.
//!
//! # Algorithm Overview
//!
//! HyperLogLog works by:
//! 1. Hashing each input item to get a uniform random 64-bit value
//! 2. Using the first p bits to select one of 2^p registers
//! 3. Counting leading zeros in the remaining bits + 1, storing max in each register
//! 4. Estimating cardinality using harmonic mean with bias correction
//!
//! # Time Complexity
//!
//! - Update: O(1)
//! - Estimate: O(m) where m = 2^precision
//! - Merge / fold: O(m)
//!
//! # Space Complexity
//!
//! O(2^p) bytes where p is precision (typically 4KB for p=12), plus an
//! 8-byte header.
//!
//! # References
//!
//! - Flajolet et al. "HyperLogLog: the analysis of a near-optimal cardinality estimation algorithm" (2007)
//! - Google's HyperLogLog++ improvements (2013)
//! - "LogLog-Beta and More: A New Algorithm for Cardinality Estimation" (Qin, Kim, Tang 2016)
//!
//! # Examples
//!
//! ```
//! use hyperloglog_rs::cardinality::HyperLogLogClassic;
//!
//! let mut hll = HyperLogLogClassic::with_owned_buffer(12).unwrap();
//!
//! for i in 0..10_000u64 {
//!     hll.add(i);
//! }
//!
//! let estimate = hll.approximate_count_distinct();
//! println!("Estimated cardinality: {}", estimate);
//! ```

use super::codecs::{self, Format};
use super::estimators;
use super::register_array::RegisterArray;
use crate::common::hash::{hash64, DEFAULT_HASH_SEED};
use crate::common::validation;
use crate::common::SketchError;

/// Size in bytes of the fixed Classic header.
pub const HEADER_SIZE: usize = 8;

const MAGIC: [u8; 2] = [b'H', b'L'];

/// The 8-byte header prefixing every serialized Classic synopsis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    format: u8,
    bucket_base: u8,
    bucket_sparse_count: u16,
}

impl Header {
    fn write(&self, out: &mut [u8]) {
        out[0] = MAGIC[0];
        out[1] = MAGIC[1];
        out[2] = self.format;
        out[3] = self.bucket_base;
        out[4..6].copy_from_slice(&self.bucket_sparse_count.to_ne_bytes());
        out[6] = 0;
        out[7] = 0;
    }

    fn read(bytes: &[u8]) -> Result<Self, SketchError> {
        validation::validate_min_size(bytes.len(), HEADER_SIZE)?;
        if bytes[0..2] != MAGIC {
            return Err(SketchError::SerializationError(
                "missing 'HL' magic bytes".to_string(),
            ));
        }
        let bucket_sparse_count = u16::from_ne_bytes([bytes[4], bytes[5]]);
        Ok(Header {
            format: bytes[2],
            bucket_base: bytes[3],
            bucket_sparse_count,
        })
    }
}

/// HLL-Classic synopsis: a precision, a register array, and the codec /
/// estimator logic tying them to the 8-byte-header wire format.
///
/// # Examples
///
/// ```
/// use hyperloglog_rs::cardinality::HyperLogLogClassic;
///
/// let mut hll = HyperLogLogClassic::with_owned_buffer(14).unwrap();
/// hll.add_item(&"user_123");
/// hll.add_item(&"user_456");
/// hll.add_item(&"user_123"); // Duplicate
///
/// assert!((hll.approximate_count_distinct() - 2.0).abs() < 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct HyperLogLogClassic {
    registers: RegisterArray,
    hash_seed: u32,
}

impl HyperLogLogClassic {
    /// Minimum supported precision.
    pub const MIN_PRECISION: u8 = validation::MIN_PRECISION;
    /// Maximum supported precision.
    pub const MAX_PRECISION: u8 = validation::MAX_PRECISION;

    /// Allocates and owns a fresh synopsis buffer for `precision`, using the
    /// default hash seed.
    ///
    /// This is the owning counterpart to [`Self::wrap_raw_buffer`], for
    /// callers who don't need to manage the byte buffer themselves.
    pub fn with_owned_buffer(precision: u8) -> Result<Self, SketchError> {
        Self::with_owned_buffer_and_seed(precision, DEFAULT_HASH_SEED)
    }

    /// As [`Self::with_owned_buffer`], with a custom MurmurHash64A seed.
    pub fn with_owned_buffer_and_seed(precision: u8, hash_seed: u32) -> Result<Self, SketchError> {
        Ok(Self {
            registers: RegisterArray::new(precision)?,
            hash_seed,
        })
    }

    /// Wraps an existing `2^precision`-byte register buffer, borrowing it
    /// for the synopsis's lifetime rather than allocating a new one.
    ///
    /// Mirrors the source library's buffer-ownership model: the façade
    /// never allocates on its own behalf once constructed this way.
    pub fn wrap_raw_buffer(
        precision: u8,
        registers: Vec<u8>,
        hash_seed: u32,
    ) -> Result<Self, SketchError> {
        Ok(Self {
            registers: RegisterArray::from_existing(precision, registers)?,
            hash_seed,
        })
    }

    /// The precision this synopsis was constructed with.
    #[inline]
    pub fn precision(&self) -> u8 {
        self.registers.precision()
    }

    /// Number of registers, `m = 2^precision`.
    #[inline]
    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Re-initializes the synopsis: zeroes all registers.
    pub fn reset(&mut self) {
        self.registers.reset();
    }

    /// True if no value has ever been added (all registers still zero).
    pub fn is_empty(&self) -> bool {
        self.registers.count_zeros() == self.registers.len()
    }

    /// Hashes `value` with MurmurHash64A (§4.1) and routes it into the
    /// synopsis directly, with no intermediate hasher.
    pub fn add(&mut self, value: u64) {
        let hash = hash64(value, self.hash_seed);
        self.add_hashed(hash);
    }

    /// Routes an arbitrary `Hash` item (strings, tuples, vectors, ...) into
    /// the synopsis.
    ///
    /// Items are collapsed to a 64-bit digest with the standard library's
    /// hasher; unlike [`Self::add`], that digest is routed straight into
    /// the registers without a second MurmurHash64A pass, since re-hashing
    /// an already-uniform digest would add no entropy, only cost.
    pub fn add_item<T: std::hash::Hash>(&mut self, value: &T) {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher;

        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        self.add_hashed(hasher.finish());
    }

    /// Routes a pre-computed 64-bit hash into the synopsis directly.
    pub fn add_hashed(&mut self, hash: u64) {
        self.registers.add_hashed(hash);
    }

    /// Merges another synopsis's registers into this one.
    ///
    /// # Errors
    /// Returns `PrecisionMismatch` if the two synopses were built with
    /// different precisions.
    pub fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        validation::validate_precision_match(self.precision(), other.precision())?;
        self.registers.merge_from(other.registers.as_slice());
        Ok(())
    }

    /// Decodes a serialized peer synopsis (header + payload) and folds it
    /// into the live registers.
    ///
    /// # Errors
    /// `SerializationError` on a too-short buffer, an unknown format code,
    /// or an out-of-range sparse bucket id.
    pub fn fold(&mut self, bytes: &[u8]) -> Result<(), SketchError> {
        let header = Header::read(bytes)?;
        let payload = &bytes[HEADER_SIZE..];
        let registers = self.registers.as_mut_slice();

        match Format::from_code(header.format) {
            Some(Format::Normal) => codecs::decode_normal(payload, registers),
            Some(Format::Compact6Bits) => codecs::decode_6bits(payload, registers),
            Some(Format::Compact5Bits) => {
                codecs::decode_5bits_with_base(payload, header.bucket_base, registers)
            }
            Some(Format::Compact4Bits) => {
                codecs::decode_4bits_with_base(payload, header.bucket_base, registers)
            }
            Some(Format::Sparse) => {
                codecs::decode_sparse(payload, header.bucket_sparse_count, registers)
            }
            None => Err(SketchError::SerializationError(format!(
                "unknown format code 0x{:02x} in fold()",
                header.format
            ))),
        }
    }

    /// Total serialized size (header + payload) for `format` at this
    /// synopsis's current state. For `Format::Sparse` this depends on the
    /// current non-zero register count.
    pub fn serialized_size(&self, format: Format) -> usize {
        let payload_size = match format {
            Format::Sparse => self.registers.count_nonzero() * 3,
            _ => codecs::max_payload_size(format, self.precision()),
        };
        HEADER_SIZE + payload_size
    }

    /// Encodes the synopsis (header + payload) into `out`, which must be at
    /// least [`Self::serialized_size`] bytes long.
    pub fn serialize(&self, format: Format, out: &mut [u8]) {
        let payload = &mut out[HEADER_SIZE..];
        let mut header = Header {
            format: format.code(),
            bucket_base: 0,
            bucket_sparse_count: 0,
        };

        match format {
            Format::Normal => codecs::encode_normal(self.registers.as_slice(), payload),
            Format::Compact6Bits => codecs::encode_6bits(self.registers.as_slice(), payload),
            Format::Compact5Bits => {
                header.bucket_base = codecs::encode_5bits_with_base(self.registers.as_slice(), payload);
            }
            Format::Compact4Bits => {
                header.bucket_base = codecs::encode_4bits_with_base(self.registers.as_slice(), payload);
            }
            Format::Sparse => {
                header.bucket_sparse_count =
                    codecs::encode_sparse(self.registers.as_slice(), payload);
            }
        }

        header.write(out);
    }

    /// True when the non-zero register count is low enough that SPARSE
    /// would produce a smaller payload than any compact format.
    pub fn prefers_sparse(&self) -> bool {
        self.registers.count_nonzero() < 256
    }

    /// The HLL++ composite estimator: raw estimate, bias-corrected for
    /// small ranges, overridden by linear counting below its threshold.
    pub fn approximate_count_distinct(&self) -> f64 {
        estimators::composite_estimate(self.registers.as_slice(), self.precision())
    }

    /// The LogLog-Beta estimator: a polynomial correction replacing the
    /// HLL++ empirical bias table.
    pub fn approximate_count_distinct_beta(&self) -> f64 {
        estimators::beta_estimate(self.registers.as_slice(), self.precision())
    }

    /// Read-only access to the underlying registers, e.g. for debugging.
    pub fn registers(&self) -> &[u8] {
        self.registers.as_slice()
    }
}

impl crate::common::Sketch for HyperLogLogClassic {
    type Item = u64;

    fn update(&mut self, item: &Self::Item) {
        self.add(*item);
    }

    fn estimate(&self) -> f64 {
        self.approximate_count_distinct()
    }

    fn is_empty(&self) -> bool {
        HyperLogLogClassic::is_empty(self)
    }
}

impl crate::common::Mergeable for HyperLogLogClassic {
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        HyperLogLogClassic::merge(self, other)
    }
}
