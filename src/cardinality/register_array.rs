//! The register synopsis owned/wrapped by HLL-Classic

use crate::common::validation;
use crate::common::SketchError;

/// A `2^p` array of one-byte registers, each storing the leftmost-one
/// position seen among the hashes routed to that register.
#[derive(Debug, Clone)]
pub struct RegisterArray {
    precision: u8,
    registers: Vec<u8>,
}

impl RegisterArray {
    /// Creates a zeroed register array for `precision` (validated to
    /// `[MIN_PRECISION, MAX_PRECISION]`).
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        validation::validate_precision(precision)?;
        let m = 1usize << precision;
        Ok(Self {
            precision,
            registers: vec![0u8; m],
        })
    }

    /// Wraps an existing slice of `2^precision` bytes as live register
    /// storage, without copying.
    pub fn from_existing(precision: u8, registers: Vec<u8>) -> Result<Self, SketchError> {
        validation::validate_precision(precision)?;
        let expected = 1usize << precision;
        if registers.len() != expected {
            return Err(SketchError::SerializationError(format!(
                "expected {} registers for precision {}, got {}",
                expected,
                precision,
                registers.len()
            )));
        }
        Ok(Self {
            precision,
            registers,
        })
    }

    /// The precision parameter this array was constructed with.
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Number of registers, `m = 2^precision`.
    #[inline]
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Read-only access to the underlying registers.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.registers
    }

    /// Mutable access to the underlying registers, for codec decoders.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.registers
    }

    /// Routes a 64-bit hash to its bucket and records the leftmost-one
    /// position of the remaining value bits, taking the max with whatever
    /// was already stored.
    pub fn add_hashed(&mut self, hash: u64) {
        let value_bits = 64 - self.precision;
        let bucket = (hash >> value_bits) as usize;
        let position = left_most_set_bit(hash, self.precision, value_bits);
        let reg = &mut self.registers[bucket];
        *reg = (*reg).max(position);
    }

    /// Merges another array of the same length into this one, taking the
    /// max per register. Callers guarantee matching lengths.
    pub fn merge_from(&mut self, other: &[u8]) {
        for (r, &o) in self.registers.iter_mut().zip(other.iter()) {
            *r = (*r).max(o);
        }
    }

    /// Count of registers still at zero.
    pub fn count_zeros(&self) -> usize {
        self.registers.iter().filter(|&&r| r == 0).count()
    }

    /// Count of registers holding a nonzero value.
    pub fn count_nonzero(&self) -> usize {
        self.registers.len() - self.count_zeros()
    }

    /// Zeroes every register in place.
    pub fn reset(&mut self) {
        self.registers.iter_mut().for_each(|r| *r = 0);
    }
}

/// Position (1-based from the MSB) of the leftmost set bit within the hash's
/// value-bits, or 0 if the value-bits are all zero.
fn left_most_set_bit(hash: u64, bucket_bits: u8, value_bits: u8) -> u8 {
    let mask = (1u64 << value_bits) - 1;
    let masked = hash & mask;
    if masked == 0 {
        0
    } else {
        masked.leading_zeros() as u8 + 1 - bucket_bits
    }
}
