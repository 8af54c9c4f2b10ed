use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog;
use crate::cell::{Modifiable, Modification};
use crate::error::MutationError;
use crate::random::RandomSource;
use crate::types::RandomLimits;

// ─── BoolModification ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoolModification {
    /// Absent stays absent.
    Toggle,
    ExplicitValue { value: bool },
}

impl Modification<bool> for BoolModification {
    fn name(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::ExplicitValue { .. } => "explicit_value",
        }
    }

    fn apply(&self, input: Option<bool>) -> Result<Option<bool>, MutationError> {
        Ok(match self {
            Self::Toggle => input.map(|b| !b),
            Self::ExplicitValue { value } => Some(*value),
        })
    }

    fn random_neighbor(&self, _limits: &RandomLimits, _rng: &mut dyn RandomSource) -> Self {
        match self {
            Self::Toggle => Self::Toggle,
            Self::ExplicitValue { value } => Self::ExplicitValue { value: !value },
        }
    }
}

impl Modifiable for bool {
    type Modification = BoolModification;
    const KIND: &'static str = "bool";

    fn random_modification(
        original: Option<&Self>,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> BoolModification {
        catalog::scalar::random_bool(original.copied(), limits, rng)
    }

    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*self)
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer)
    }
}

// ─── ByteModification ───────────────────────────────────────────────────────

/// Single-byte arithmetic, wrapping. `Add` and `Xor` read an absent byte as 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ByteModification {
    Add { summand: u8 },
    Xor { key: u8 },
    ExplicitValue { value: u8 },
}

impl Modification<u8> for ByteModification {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Xor { .. } => "xor",
            Self::ExplicitValue { .. } => "explicit_value",
        }
    }

    fn apply(&self, input: Option<u8>) -> Result<Option<u8>, MutationError> {
        match (self, input) {
            (Self::Add { summand }, input) => Ok(Some(input.unwrap_or(0).wrapping_add(*summand))),
            (Self::Xor { key }, input) => Ok(Some(input.unwrap_or(0) ^ key)),
            (Self::ExplicitValue { .. }, None) => Err(MutationError::MissingOriginal {
                operation: "explicit_value",
            }),
            (Self::ExplicitValue { value }, Some(_)) => Ok(Some(*value)),
        }
    }

    fn random_neighbor(&self, limits: &RandomLimits, rng: &mut dyn RandomSource) -> Self {
        let step = rng.next_signed(limits.max_position_step.max(1)) as i8 as u8;
        match self {
            Self::Add { summand } => Self::Add {
                summand: summand.wrapping_add(step),
            },
            Self::Xor { key } => Self::Xor {
                key: key ^ (1 << rng.next_uint(8)),
            },
            Self::ExplicitValue { value } => Self::ExplicitValue {
                value: value.wrapping_add(step),
            },
        }
    }
}

impl Modifiable for u8 {
    type Modification = ByteModification;
    const KIND: &'static str = "byte";

    fn random_modification(
        original: Option<&Self>,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> ByteModification {
        catalog::scalar::random_byte(original.copied(), limits, rng)
    }

    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self)
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer)
    }
}
