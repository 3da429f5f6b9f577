//! Core traits for the two synopsis engines

use super::error::SketchError;

/// Core trait that all sketches must implement
///
/// # SOLID Principles
/// - **Single Responsibility**: This trait focuses solely on core sketch operations
/// - **Interface Segregation**: Minimal interface - only essential operations
/// - **Liskov Substitution**: All implementations must maintain the contract
pub trait Sketch {
    /// The type of items this sketch can process
    type Item;

    /// Update the sketch with a new item
    fn update(&mut self, item: &Self::Item);

    /// Get the estimated cardinality
    fn estimate(&self) -> f64;

    /// Check if the sketch has not observed any items
    fn is_empty(&self) -> bool;
}

/// Trait for sketches that support merging
///
/// # SOLID Principles
/// - **Interface Segregation**: Separate trait for mergeable sketches
pub trait Mergeable: Sketch {
    /// Merge another sketch into this one. After merging, this sketch
    /// represents the union of both.
    ///
    /// # Errors
    /// Returns `SketchError::PrecisionMismatch` if the two sketches were
    /// built with different precisions.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;
}
