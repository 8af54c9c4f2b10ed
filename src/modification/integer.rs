use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::Hash;
use tracing::debug;

use super::nudge;
use crate::catalog;
use crate::cell::{Modifiable, Modification};
use crate::error::MutationError;
use crate::random::RandomSource;
use crate::types::RandomLimits;

// ─── FixedWidth ─────────────────────────────────────────────────────────────

/// Native fixed-width integer with wrapping two's-complement arithmetic.
pub trait FixedWidth:
    Copy + Eq + Hash + fmt::Debug + Default + Serialize + DeserializeOwned + 'static
{
    const BITS: u32;
    const KIND: &'static str;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn bitxor(self, rhs: Self) -> Self;
    /// Native shift; arithmetic for signed types, logical for unsigned.
    fn wrapping_shl(self, n: u32) -> Self;
    fn wrapping_shr(self, n: u32) -> Self;
    fn swap_bytes(self) -> Self;
    /// Zero-extended two's-complement bit pattern.
    fn to_bits(self) -> u64;
    /// Keeps the low `BITS` bits.
    fn from_bits(bits: u64) -> Self;
    fn from_i64_wrapping(v: i64) -> Self;
}

macro_rules! impl_fixed_width {
    ($($t:ty => $u:ty, $kind:literal);* $(;)?) => {
        $(
            impl FixedWidth for $t {
                const BITS: u32 = <$t>::BITS;
                const KIND: &'static str = $kind;

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }
                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }
                #[inline]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$t>::wrapping_mul(self, rhs)
                }
                #[inline]
                fn bitxor(self, rhs: Self) -> Self {
                    self ^ rhs
                }
                #[inline]
                fn wrapping_shl(self, n: u32) -> Self {
                    <$t>::wrapping_shl(self, n)
                }
                #[inline]
                fn wrapping_shr(self, n: u32) -> Self {
                    <$t>::wrapping_shr(self, n)
                }
                #[inline]
                fn swap_bytes(self) -> Self {
                    <$t>::swap_bytes(self)
                }
                #[inline]
                fn to_bits(self) -> u64 {
                    self as $u as u64
                }
                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as $u as $t
                }
                #[inline]
                fn from_i64_wrapping(v: i64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_fixed_width! {
    i32 => u32, "i32";
    i64 => u64, "i64";
    u32 => u32, "u32";
    u64 => u64, "u64";
}

// ─── Bit helpers ────────────────────────────────────────────────────────────

#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[inline]
fn shl_or_zero(v: u64, n: u32) -> u64 {
    v.checked_shl(n).unwrap_or(0)
}

#[inline]
fn shr_or_zero(v: u64, n: u32) -> u64 {
    v.checked_shr(n).unwrap_or(0)
}

/// Position of the highest set bit plus one; 0 for 0. Negative values span the full width.
#[inline]
pub fn bit_length<T: FixedWidth>(v: T) -> u32 {
    u64::BITS - v.to_bits().leading_zeros()
}

/// Bit offset an insert lands at: negative counts from the top, then wraps modulo the width.
#[inline]
pub fn insert_offset<T: FixedWidth>(position: i64) -> u32 {
    let width = T::BITS as i64;
    let p = if position < 0 { position + width } else { position };
    p.rem_euclid(width) as u32
}

/// `input`'s bits followed by `value`'s minimal bits.
pub fn append_bits<T: FixedWidth>(input: T, value: T) -> T {
    T::from_bits(shl_or_zero(input.to_bits(), bit_length(value)) | value.to_bits())
}

/// `value`'s bits followed by `input`'s minimal bits.
pub fn prepend_bits<T: FixedWidth>(input: T, value: T) -> T {
    T::from_bits(shl_or_zero(value.to_bits(), bit_length(input)) | input.to_bits())
}

/// Splice `value`'s minimal bits into `input` at bit [`insert_offset`].
///
/// Bits of `input` at and above the offset move up by `bit_length(value)`;
/// whatever passes the top of the width is dropped.
pub fn insert_bits<T: FixedWidth>(input: T, value: T, position: i64) -> T {
    let offset = insert_offset::<T>(position);
    let inserted_len = bit_length(value);
    let bits = input.to_bits();
    let high = shr_or_zero(bits, offset);
    let low = bits & low_mask(offset);
    let composed = shl_or_zero(shl_or_zero(high, inserted_len) | value.to_bits(), offset) | low;
    T::from_bits(composed & low_mask(T::BITS))
}

// ─── IntegerModification ────────────────────────────────────────────────────

/// Transforms over 32- and 64-bit integers.
///
/// Arithmetic wraps. Shift amounts are taken modulo the width.
///
/// | Variant                                         | Absent original |
/// |-------------------------------------------------|-----------------|
/// | `Add`, `Subtract`, `Multiply`, `Xor`            | treated as 0    |
/// | `ShiftLeft`, `ShiftRight`, `SwapEndian`         | stays absent    |
/// | `Append`, `Prepend`, `Insert`                   | stays absent    |
/// | `ExplicitValue`                                 | error           |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegerModification<T> {
    Add { summand: T },
    Subtract { subtrahend: T },
    Multiply { factor: T },
    Xor { key: T },
    ShiftLeft { shift: u32 },
    ShiftRight { shift: u32 },
    SwapEndian,
    ExplicitValue { value: T },
    Append { value: T },
    Prepend { value: T },
    Insert { value: T, position: i64 },
}

impl<T: FixedWidth> IntegerModification<T> {
    pub fn add(summand: T) -> Self {
        Self::Add { summand }
    }

    pub fn subtract(subtrahend: T) -> Self {
        Self::Subtract { subtrahend }
    }

    pub fn multiply(factor: T) -> Self {
        Self::Multiply { factor }
    }

    pub fn xor(key: T) -> Self {
        Self::Xor { key }
    }

    pub fn shift_left(shift: u32) -> Self {
        Self::ShiftLeft { shift }
    }

    pub fn shift_right(shift: u32) -> Self {
        Self::ShiftRight { shift }
    }

    pub fn swap_endian() -> Self {
        Self::SwapEndian
    }

    pub fn explicit_value(value: T) -> Self {
        Self::ExplicitValue { value }
    }

    pub fn append(value: T) -> Self {
        Self::Append { value }
    }

    pub fn prepend(value: T) -> Self {
        Self::Prepend { value }
    }

    pub fn insert(value: T, position: i64) -> Self {
        Self::Insert { value, position }
    }
}

fn arithmetic_step<T: FixedWidth>(limits: &RandomLimits, rng: &mut dyn RandomSource) -> T {
    T::from_i64_wrapping(rng.next_signed(limits.max_arithmetic_step.max(1)))
}

impl<T: FixedWidth> Modification<T> for IntegerModification<T> {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Subtract { .. } => "subtract",
            Self::Multiply { .. } => "multiply",
            Self::Xor { .. } => "xor",
            Self::ShiftLeft { .. } => "shift_left",
            Self::ShiftRight { .. } => "shift_right",
            Self::SwapEndian => "swap_endian",
            Self::ExplicitValue { .. } => "explicit_value",
            Self::Append { .. } => "append",
            Self::Prepend { .. } => "prepend",
            Self::Insert { .. } => "insert",
        }
    }

    fn apply(&self, input: Option<T>) -> Result<Option<T>, MutationError> {
        let out = match (self, input) {
            (Self::Add { summand }, input) => input.unwrap_or_default().wrapping_add(*summand),
            (Self::Subtract { subtrahend }, input) => {
                input.unwrap_or_default().wrapping_sub(*subtrahend)
            }
            (Self::Multiply { factor }, input) => input.unwrap_or_default().wrapping_mul(*factor),
            (Self::Xor { key }, input) => input.unwrap_or_default().bitxor(*key),
            (Self::ExplicitValue { .. }, None) => {
                debug!(kind = T::KIND, "explicit value without an original");
                return Err(MutationError::MissingOriginal {
                    operation: "explicit_value",
                });
            }
            (Self::ExplicitValue { value }, Some(_)) => *value,
            (_, None) => return Ok(None),
            (Self::ShiftLeft { shift }, Some(input)) => input.wrapping_shl(shift % T::BITS),
            (Self::ShiftRight { shift }, Some(input)) => input.wrapping_shr(shift % T::BITS),
            (Self::SwapEndian, Some(input)) => input.swap_bytes(),
            (Self::Append { value }, Some(input)) => append_bits(input, *value),
            (Self::Prepend { value }, Some(input)) => prepend_bits(input, *value),
            (Self::Insert { value, position }, Some(input)) => {
                insert_bits(input, *value, *position)
            }
        };
        Ok(Some(out))
    }

    fn random_neighbor(&self, limits: &RandomLimits, rng: &mut dyn RandomSource) -> Self {
        let width = T::BITS as i64;
        match *self {
            Self::Add { summand } => Self::add(summand.wrapping_add(arithmetic_step(limits, rng))),
            Self::Subtract { subtrahend } => {
                Self::subtract(subtrahend.wrapping_add(arithmetic_step(limits, rng)))
            }
            Self::Multiply { factor } => {
                Self::multiply(factor.wrapping_add(arithmetic_step(limits, rng)))
            }
            Self::Xor { key } => Self::xor(key.bitxor(T::from_bits(1 << rng.next_uint(T::BITS as u64)))),
            Self::ShiftLeft { shift } => {
                Self::shift_left(nudge(shift as i64, limits, rng).rem_euclid(width) as u32)
            }
            Self::ShiftRight { shift } => {
                Self::shift_right(nudge(shift as i64, limits, rng).rem_euclid(width) as u32)
            }
            Self::SwapEndian => Self::SwapEndian,
            Self::ExplicitValue { value } => {
                Self::explicit_value(value.wrapping_add(arithmetic_step(limits, rng)))
            }
            Self::Append { value } => Self::append(value.wrapping_add(arithmetic_step(limits, rng))),
            Self::Prepend { value } => {
                Self::prepend(value.wrapping_add(arithmetic_step(limits, rng)))
            }
            Self::Insert { value, position } => {
                if rng.next_bool() {
                    Self::insert(value, nudge(position, limits, rng))
                } else {
                    Self::insert(value.wrapping_add(arithmetic_step(limits, rng)), position)
                }
            }
        }
    }
}

// ─── Modifiable ─────────────────────────────────────────────────────────────

macro_rules! impl_modifiable_integer {
    ($($t:ty),*) => {
        $(
            impl Modifiable for $t {
                type Modification = IntegerModification<$t>;
                const KIND: &'static str = <$t as FixedWidth>::KIND;

                fn random_modification(
                    original: Option<&Self>,
                    limits: &RandomLimits,
                    rng: &mut dyn RandomSource,
                ) -> IntegerModification<$t> {
                    catalog::integer::random(original.copied(), limits, rng)
                }

                fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    Serialize::serialize(self, serializer)
                }

                fn deserialize_value<'de, D: Deserializer<'de>>(
                    deserializer: D,
                ) -> Result<Self, D::Error> {
                    <$t as Deserialize>::deserialize(deserializer)
                }
            }
        )*
    };
}

impl_modifiable_integer!(i32, i64, u32, u64);
