//! Random selection of a modification for a given original value.
//!
//! Each data kind has one `random` entry point. Generated positions and counts
//! are drawn inside the bounds of the original so that a fresh modification
//! does something observable; degenerate shapes (an empty buffer, an absent
//! value) only draw variants that make sense for them.

pub mod bytes;
pub mod integer;
pub mod path;
pub mod scalar;
pub mod text;

use crate::random::RandomSource;
use crate::types::RandomLimits;

/// Uniform pick from a non-empty list of variant tags.
#[inline]
pub(crate) fn pick<T: Copy>(options: &[T], rng: &mut dyn RandomSource) -> T {
    options[rng.next_index(options.len())]
}

/// Index in `0..=len`, as an `i64` position.
#[inline]
pub(crate) fn position_inclusive(len: usize, rng: &mut dyn RandomSource) -> i64 {
    rng.next_index(len + 1) as i64
}

/// Fresh payload of at least one byte.
pub(crate) fn payload(limits: &RandomLimits, rng: &mut dyn RandomSource) -> Vec<u8> {
    rng.random_bytes(1, limits.max_payload_len.max(1))
}

/// Fresh string of at least one character.
pub(crate) fn string(limits: &RandomLimits, rng: &mut dyn RandomSource) -> String {
    rng.random_string(1, limits.max_string_len.max(1))
}

/// Count in `1..=max`.
#[inline]
pub(crate) fn repeat(max: u64, rng: &mut dyn RandomSource) -> i64 {
    (1 + rng.next_uint(max.max(1))) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_helpers_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let limits = RandomLimits::default();
        for _ in 0..200 {
            assert!((0..=3).contains(&position_inclusive(3, &mut rng)));
            assert!((1..=4).contains(&repeat(4, &mut rng)));
            let p = payload(&limits, &mut rng);
            assert!(!p.is_empty() && p.len() <= limits.max_payload_len);
        }
        assert_eq!(repeat(0, &mut rng), 1);
        assert_eq!(pick(&[7u8], &mut rng), 7);
    }
}
