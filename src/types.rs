use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use crate::error::MutationError;

pub type FastHashSet<T> = HashSet<T, BuildHasherDefault<FxHasher>>;

/// Ceiling for every length and repeat limit loaded from configuration.
pub const MAX_GENERATED_LEN: usize = 1 << 20;

// ─── RandomLimits ───────────────────────────────────────────────────────────

/// Bounds for every randomly generated modification parameter.
///
/// Used by the catalog when picking a fresh modification for a value and by
/// `random_neighbor` when perturbing an existing one. Missing keys in a JSON
/// document fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomLimits {
    /// Longest byte payload the catalog generates (append, insert, explicit...).
    ///
    /// Default: 16 bytes.
    pub max_payload_len: usize,
    /// Longest xor key the catalog generates. Never longer than the target.
    ///
    /// Default: 8 bytes.
    pub max_xor_key_len: usize,
    /// Largest step a random neighbor moves a position or count by.
    ///
    /// Default: 8.
    pub max_position_step: u64,
    /// Largest magnitude of a random arithmetic operand or its perturbation.
    ///
    /// Default: 32 000.
    pub max_arithmetic_step: u64,
    /// Most index pairs a generated shuffle carries.
    ///
    /// Default: 4.
    pub max_shuffle_pairs: usize,
    /// Most `..` segments or extra separators a path generator injects.
    ///
    /// Default: 8.
    pub max_path_repeat: u64,
    /// Longest generated string or path segment, in characters.
    ///
    /// Default: 16.
    pub max_string_len: usize,
}

impl Default for RandomLimits {
    fn default() -> Self {
        Self {
            max_payload_len: 16,
            max_xor_key_len: 8,
            max_position_step: 8,
            max_arithmetic_step: 32_000,
            max_shuffle_pairs: 4,
            max_path_repeat: 8,
            max_string_len: 16,
        }
    }
}

impl RandomLimits {
    /// Parse limits from a (possibly partial) JSON object.
    ///
    /// Length and repeat limits above [`MAX_GENERATED_LEN`] are rejected.
    pub fn from_json(json: &str) -> Result<Self, MutationError> {
        let limits: Self =
            serde_json::from_str(json).map_err(|e| MutationError::Config(e.to_string()))?;
        limits.validate()?;
        Ok(limits)
    }

    fn validate(&self) -> Result<(), MutationError> {
        let lengths = [
            ("max_payload_len", self.max_payload_len as u64),
            ("max_xor_key_len", self.max_xor_key_len as u64),
            ("max_shuffle_pairs", self.max_shuffle_pairs as u64),
            ("max_string_len", self.max_string_len as u64),
            ("max_path_repeat", self.max_path_repeat),
        ];
        match lengths
            .iter()
            .find(|(_, value)| *value > MAX_GENERATED_LEN as u64)
        {
            Some((name, value)) => Err(MutationError::Config(format!(
                "{name} = {value} exceeds {MAX_GENERATED_LEN}"
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let limits = RandomLimits::from_json(r#"{ "max_payload_len": 3 }"#).unwrap();
        assert_eq!(limits.max_payload_len, 3);
        assert_eq!(limits.max_xor_key_len, RandomLimits::default().max_xor_key_len);
        assert_eq!(limits.max_path_repeat, 8);
    }

    #[test]
    fn test_oversized_limits_are_rejected() {
        let json = format!(r#"{{ "max_payload_len": {} }}"#, usize::MAX);
        let err = RandomLimits::from_json(&json).unwrap_err();
        assert!(matches!(err, MutationError::Config(ref msg) if msg.contains("max_payload_len")));

        let json = format!(r#"{{ "max_string_len": {MAX_GENERATED_LEN} }}"#);
        assert!(RandomLimits::from_json(&json).is_ok());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = RandomLimits::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MutationError::Config(_)));
    }
}
