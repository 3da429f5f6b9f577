//! Hash functions for HyperLogLog synopses
//!
//! Both engines are hash-agnostic in principle (the caller may always route
//! pre-hashed bits straight into a register), but each ships the hash its
//! reference implementation was calibrated and made wire-compatible against:
//! MurmurHash64A for HLL-Classic, MurmurHash3 x64 128-bit for HLL-Druid.

/// Default seed used by HLL-Classic's `hash64`, matching the reference synopsis format.
pub const DEFAULT_HASH_SEED: u32 = 27072015;

/// MurmurHash64A over the 8 little-endian bytes of `value`.
///
/// This is Austin Appleby's original 64-bit MurmurHash2 variant ("64A"),
/// operating on a single 8-byte block with no tail handling required.
///
/// # Examples
/// ```
/// use hyperloglog_rs::common::hash::hash64;
///
/// let h = hash64(42, hyperloglog_rs::common::hash::DEFAULT_HASH_SEED);
/// assert_eq!(h, hash64(42, hyperloglog_rs::common::hash::DEFAULT_HASH_SEED));
/// ```
pub fn hash64(value: u64, seed: u32) -> u64 {
    const M: u64 = 0xc6a4a7935bd1e995;
    const R: u32 = 47;

    let mut h: u64 = (seed as u64) ^ (8u64.wrapping_mul(M));

    let mut k = value;
    k = k.wrapping_mul(M);
    k ^= k >> R;
    k = k.wrapping_mul(M);

    h ^= k;
    h = h.wrapping_mul(M);

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;

    h
}

/// MurmurHash3 x64 128-bit hash over an arbitrary byte slice, seed 0.
///
/// Used only by HLL-Druid's convenience `add(scalar)` wrapper, which
/// stringifies the value before hashing for wire compatibility with
/// Apache Druid's own sketch population path.
///
/// # Examples
/// ```
/// use hyperloglog_rs::common::hash::hash128;
///
/// let h = hash128(b"42");
/// assert_eq!(h.len(), 16);
/// ```
pub fn hash128(data: &[u8]) -> [u8; 16] {
    const C1: u64 = 0x87c3_7b91_1142_53d5;
    const C2: u64 = 0x4cf5_ad43_2745_937f;

    let len = data.len();
    let seed: u64 = 0;
    let mut h1: u64 = seed;
    let mut h2: u64 = seed;

    let nblocks = len / 16;
    for i in 0..nblocks {
        let block = &data[i * 16..i * 16 + 16];
        let mut k1 = u64::from_le_bytes(block[0..8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(block[8..16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;

        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dce729);

        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;

        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x38495ab5);
    }

    let tail = &data[nblocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;

    if tail.len() > 8 {
        for i in (8..tail.len()).rev() {
            k2 ^= (tail[i] as u64) << ((i - 8) * 8);
        }
        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;
    }
    if !tail.is_empty() {
        for i in (0..tail.len().min(8)).rev() {
            k1 ^= (tail[i] as u64) << (i * 8);
        }
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u64;
    h2 ^= len as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(&h1.to_le_bytes());
    out[8..16].copy_from_slice(&h2.to_le_bytes());
    out
}

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^= k >> 33;
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash64_deterministic() {
        assert_eq!(hash64(42, DEFAULT_HASH_SEED), hash64(42, DEFAULT_HASH_SEED));
    }

    #[test]
    fn test_hash64_seed_changes_output() {
        assert_ne!(hash64(42, 0), hash64(42, 1));
    }

    #[test]
    fn test_hash64_distinguishes_values() {
        assert_ne!(hash64(1, DEFAULT_HASH_SEED), hash64(2, DEFAULT_HASH_SEED));
    }

    #[test]
    fn test_hash128_length_and_determinism() {
        let a = hash128(b"42");
        let b = hash128(b"42");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_hash128_distinguishes_inputs() {
        assert_ne!(hash128(b"42"), hash128(b"43"));
    }

    #[test]
    fn test_hash128_empty_input() {
        // Must not panic on empty input (zero blocks, zero tail).
        let _ = hash128(b"");
    }

    #[test]
    fn test_hash128_long_input() {
        let data = vec![7u8; 200];
        let h = hash128(&data);
        assert_eq!(h.len(), 16);
    }
}
