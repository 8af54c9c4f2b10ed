use crate::modification::{BoolModification, ByteModification};
use crate::random::RandomSource;
use crate::types::RandomLimits;

pub fn random_bool(
    original: Option<bool>,
    _limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> BoolModification {
    match original {
        // Toggle would leave an absent flag absent.
        None => BoolModification::ExplicitValue {
            value: rng.next_bool(),
        },
        Some(value) if rng.next_bool() => BoolModification::ExplicitValue { value: !value },
        Some(_) => BoolModification::Toggle,
    }
}

pub fn random_byte(
    original: Option<u8>,
    _limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> ByteModification {
    // Never zero, so the operand always changes the byte.
    let operand = 1 + rng.next_uint(255) as u8;
    match (original, rng.next_uint(3)) {
        (_, 0) => ByteModification::Add { summand: operand },
        (None, _) | (_, 1) => ByteModification::Xor { key: operand },
        (Some(value), _) => ByteModification::ExplicitValue {
            value: value.wrapping_add(operand),
        },
    }
}
