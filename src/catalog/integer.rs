use super::pick;
use crate::modification::{FixedWidth, IntegerModification};
use crate::random::RandomSource;
use crate::types::RandomLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Add,
    Subtract,
    Multiply,
    Xor,
    ShiftLeft,
    ShiftRight,
    SwapEndian,
    ExplicitValue,
    Append,
    Prepend,
    Insert,
}

/// Variants that read an absent original as zero.
const ABSENT: [Kind; 4] = [Kind::Add, Kind::Subtract, Kind::Multiply, Kind::Xor];

const PRESENT: [Kind; 11] = [
    Kind::Add,
    Kind::Subtract,
    Kind::Multiply,
    Kind::Xor,
    Kind::ShiftLeft,
    Kind::ShiftRight,
    Kind::SwapEndian,
    Kind::ExplicitValue,
    Kind::Append,
    Kind::Prepend,
    Kind::Insert,
];

fn full_width<T: FixedWidth>(rng: &mut dyn RandomSource) -> T {
    let mut buf = [0u8; 8];
    rng.fill_random_bytes(&mut buf);
    T::from_bits(u64::from_le_bytes(buf))
}

fn operand<T: FixedWidth>(limits: &RandomLimits, rng: &mut dyn RandomSource) -> T {
    T::from_i64_wrapping(rng.next_signed(limits.max_arithmetic_step.max(1)))
}

/// An integer modification for `original`. An absent original never draws
/// a variant that would error or stay absent.
pub fn random<T: FixedWidth>(
    original: Option<T>,
    limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> IntegerModification<T> {
    let kind = match original {
        None => pick(&ABSENT, rng),
        Some(_) => pick(&PRESENT, rng),
    };
    match kind {
        Kind::Add => IntegerModification::add(operand(limits, rng)),
        Kind::Subtract => IntegerModification::subtract(operand(limits, rng)),
        Kind::Multiply => IntegerModification::multiply(operand(limits, rng)),
        Kind::Xor => IntegerModification::xor(full_width(rng)),
        Kind::ShiftLeft => IntegerModification::shift_left(rng.next_uint(T::BITS as u64) as u32),
        Kind::ShiftRight => IntegerModification::shift_right(rng.next_uint(T::BITS as u64) as u32),
        Kind::SwapEndian => IntegerModification::swap_endian(),
        Kind::ExplicitValue => IntegerModification::explicit_value(full_width(rng)),
        Kind::Append => IntegerModification::append(full_width(rng)),
        Kind::Prepend => IntegerModification::prepend(full_width(rng)),
        Kind::Insert => {
            let position = rng.next_uint(T::BITS as u64) as i64;
            IntegerModification::insert(full_width(rng), position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Modification;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_absent_original_never_errors() {
        let mut rng = StdRng::seed_from_u64(21);
        let limits = RandomLimits::default();
        for _ in 0..300 {
            let m = random::<i32>(None, &limits, &mut rng);
            assert!(matches!(m.apply(None), Ok(Some(_))), "{m:?}");
        }
    }

    #[test]
    fn test_shift_and_position_within_width() {
        let mut rng = StdRng::seed_from_u64(22);
        let limits = RandomLimits::default();
        for _ in 0..1000 {
            match random::<i32>(Some(5), &limits, &mut rng) {
                IntegerModification::ShiftLeft { shift }
                | IntegerModification::ShiftRight { shift } => assert!(shift < 32),
                IntegerModification::Insert { position, .. } => {
                    assert!((0..32).contains(&position))
                }
                _ => {}
            }
            if let IntegerModification::Insert { position, .. } =
                random::<u64>(Some(5), &limits, &mut rng)
            {
                assert!((0..64).contains(&position));
            }
        }
    }

    #[test]
    fn test_arithmetic_operands_bounded() {
        let mut rng = StdRng::seed_from_u64(23);
        let limits = RandomLimits {
            max_arithmetic_step: 10,
            ..RandomLimits::default()
        };
        for _ in 0..500 {
            match random::<i64>(Some(0), &limits, &mut rng) {
                IntegerModification::Add { summand: v }
                | IntegerModification::Subtract { subtrahend: v }
                | IntegerModification::Multiply { factor: v } => assert!((-10..=10).contains(&v)),
                _ => {}
            }
        }
    }

    #[test]
    fn test_every_variant_reachable() {
        let mut rng = StdRng::seed_from_u64(24);
        let limits = RandomLimits::default();
        let mut names: Vec<&str> = (0..2000)
            .map(|_| random::<u32>(Some(1), &limits, &mut rng).name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 11);
    }
}
