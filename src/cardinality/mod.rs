//! Cardinality estimation: HyperLogLog, in two wire-incompatible flavors.
//!
//! | Engine | Precision | Registers | Wire compatibility |
//! |--------|-----------|-----------|---------------------|
//! | [`HyperLogLogClassic`] | configurable, 4..=18 | `2^p` one-byte | NORMAL/COMPACT/SPARSE encodings |
//! | [`HllDruid`] | fixed at 11 | 2048 four-bit | Apache Druid's `HyperLogLogCollector` |
//!
//! [`LinearCounting`] is the auxiliary small-range estimator both engines'
//! composite estimators fall back to; it's also usable standalone.

mod bias;
mod codecs;
mod druid;
mod estimators;
mod hyperloglog;
mod linear_counting;
mod register_array;

pub use codecs::Format;
pub use druid::HllDruid;
pub use hyperloglog::HyperLogLogClassic;
pub use linear_counting::LinearCounting;
