//! Error types for HyperLogLog operations

use std::fmt;

/// Errors that can occur during sketch operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Precision argument fell outside the supported range
    PrecisionOutOfRange {
        /// The value that was rejected
        value: u8,
        /// Lower bound (inclusive)
        min: u8,
        /// Upper bound (inclusive)
        max: u8,
    },

    /// Attempted to combine two synopses that were built with different precisions
    PrecisionMismatch {
        /// Precision of the synopsis being operated on
        left: u8,
        /// Precision of the synopsis passed in
        right: u8,
    },

    /// A serialized payload was malformed: too short for its declared format,
    /// an unknown format code, or an out-of-range bucket id
    SerializationError(String),

    /// A configuration option supplied at a boundary was invalid
    ConfigError {
        /// Option name
        param: String,
        /// Rejected value
        value: String,
        /// Constraint that was violated
        constraint: String,
    },
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::PrecisionOutOfRange { value, min, max } => {
                write!(f, "precision {} out of range: must be in [{}, {}]", value, min, max)
            }
            SketchError::PrecisionMismatch { left, right } => {
                write!(f, "precision mismatch: {} vs {}", left, right)
            }
            SketchError::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            SketchError::ConfigError {
                param,
                value,
                constraint,
            } => write!(
                f,
                "invalid config option '{}': value '{}' {}",
                param, value, constraint
            ),
        }
    }
}

impl std::error::Error for SketchError {}

/// Result type alias for sketch operations
pub type Result<T> = std::result::Result<T, SketchError>;
