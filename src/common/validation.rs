//! Validation utilities for synopsis construction and deserialization

use crate::common::{Result, SketchError};

/// Minimum supported precision for HLL-Classic
pub const MIN_PRECISION: u8 = 4;
/// Maximum supported precision for HLL-Classic
pub const MAX_PRECISION: u8 = 18;

/// Maximum serialized payload size accepted during deserialization (256MB),
/// guarding against pathological allocation requests from corrupt input.
pub const MAX_BYTE_SIZE: usize = 256 * 1024 * 1024;

/// Validate that precision is within the supported range [4, 18]
pub fn validate_precision(precision: u8) -> Result<()> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        return Err(SketchError::PrecisionOutOfRange {
            value: precision,
            min: MIN_PRECISION,
            max: MAX_PRECISION,
        });
    }
    Ok(())
}

/// Validate that two synopses share a precision before merging
pub fn validate_precision_match(left: u8, right: u8) -> Result<()> {
    if left != right {
        return Err(SketchError::PrecisionMismatch { left, right });
    }
    Ok(())
}

/// Validate that a deserialized payload size doesn't exceed safety limits
pub fn validate_byte_size(size: usize) -> Result<()> {
    if size > MAX_BYTE_SIZE {
        return Err(SketchError::SerializationError(format!(
            "payload size {} exceeds maximum allowed size {}",
            size, MAX_BYTE_SIZE
        )));
    }
    Ok(())
}

/// Validate minimum required bytes for a buffer
pub fn validate_min_size(actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(SketchError::SerializationError(format!(
            "insufficient data: need at least {} bytes, got {}",
            required, actual
        )));
    }
    Ok(())
}

/// Validate the `bits_per_bucket` configuration option, which selects the
/// compact wire format (4 -> COMPACT_4BITS, 5 -> COMPACT_5BITS,
/// 6 -> COMPACT_6BITS, 8 -> NORMAL)
pub fn validate_bits_per_bucket(bits_per_bucket: u8) -> Result<()> {
    if !matches!(bits_per_bucket, 4 | 5 | 6 | 8) {
        return Err(SketchError::ConfigError {
            param: "bits_per_bucket".to_string(),
            value: bits_per_bucket.to_string(),
            constraint: "must be one of {4, 5, 6, 8}".to_string(),
        });
    }
    Ok(())
}
