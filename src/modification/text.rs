use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{nudge, resolve_start, tweak_string, wrap_insert_index};
use crate::catalog;
use crate::cell::{Modifiable, Modification};
use crate::error::MutationError;
use crate::random::RandomSource;
use crate::types::RandomLimits;

// ─── StringModification ─────────────────────────────────────────────────────

/// Transforms over text. Positions and counts are in characters, not bytes.
///
/// | Variant             | Absent original  |
/// |---------------------|------------------|
/// | `Append`, `Prepend` | treated as empty |
/// | `Insert`, `Delete`  | stays absent     |
/// | `ExplicitValue`     | ignored          |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StringModification {
    Append { value: String },
    Prepend { value: String },
    Insert { value: String, position: i64 },
    Delete { position: i64, count: i64 },
    ExplicitValue { value: String },
}

impl StringModification {
    pub fn append(value: impl Into<String>) -> Self {
        Self::Append {
            value: value.into(),
        }
    }

    pub fn prepend(value: impl Into<String>) -> Self {
        Self::Prepend {
            value: value.into(),
        }
    }

    pub fn insert(value: impl Into<String>, position: i64) -> Self {
        Self::Insert {
            value: value.into(),
            position,
        }
    }

    pub fn delete(position: i64, count: i64) -> Self {
        Self::Delete { position, count }
    }

    pub fn explicit_value(value: impl Into<String>) -> Self {
        Self::ExplicitValue {
            value: value.into(),
        }
    }
}

// ─── Algorithms ─────────────────────────────────────────────────────────────

/// Byte offset of the `char_idx`-th character (or the end).
fn byte_offset(input: &str, char_idx: usize) -> usize {
    input
        .char_indices()
        .nth(char_idx)
        .map_or(input.len(), |(offset, _)| offset)
}

/// Same wrap rule as the byte-sequence insert, over characters.
pub fn insert(input: &str, value: &str, position: i64) -> String {
    let idx = wrap_insert_index(position, input.chars().count());
    let at = byte_offset(input, idx);
    let mut out = String::with_capacity(input.len() + value.len());
    out.push_str(&input[..at]);
    out.push_str(value);
    out.push_str(&input[at..]);
    out
}

/// Delete `count` characters at `position`, by the byte-sequence rules over
/// characters. A negative count clamps to zero, which leaves the input as is.
pub fn delete(input: &str, position: i64, count: i64) -> String {
    let len = input.chars().count();
    let count = count.max(0) as usize;
    let Some((start, end)) = resolve_start(position, len)
        .filter(|_| count > 0)
        .and_then(|start| Some((start, start.checked_add(count)?)))
        .filter(|&(_, end)| end <= len)
    else {
        return input.to_string();
    };
    let (from, to) = (byte_offset(input, start), byte_offset(input, end));
    let mut out = String::with_capacity(input.len() - (to - from));
    out.push_str(&input[..from]);
    out.push_str(&input[to..]);
    out
}

// ─── Modification impl ──────────────────────────────────────────────────────

impl Modification<String> for StringModification {
    fn name(&self) -> &'static str {
        match self {
            Self::Append { .. } => "append",
            Self::Prepend { .. } => "prepend",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::ExplicitValue { .. } => "explicit_value",
        }
    }

    fn apply(&self, input: Option<String>) -> Result<Option<String>, MutationError> {
        let out = match (self, input) {
            (Self::ExplicitValue { value }, _) => value.clone(),
            (Self::Append { value }, input) => {
                let mut out = input.unwrap_or_default();
                out.push_str(value);
                out
            }
            (Self::Prepend { value }, input) => {
                let mut out = value.clone();
                out.push_str(input.as_deref().unwrap_or_default());
                out
            }
            (_, None) => return Ok(None),
            (Self::Insert { value, position }, Some(input)) => insert(&input, value, *position),
            (Self::Delete { position, count }, Some(input)) => delete(&input, *position, *count),
        };
        Ok(Some(out))
    }

    fn random_neighbor(&self, limits: &RandomLimits, rng: &mut dyn RandomSource) -> Self {
        match self {
            Self::Append { value } => Self::append(tweak_string(value, limits, rng)),
            Self::Prepend { value } => Self::prepend(tweak_string(value, limits, rng)),
            Self::ExplicitValue { value } => Self::explicit_value(tweak_string(value, limits, rng)),
            Self::Insert { value, position } => {
                if rng.next_bool() {
                    Self::insert(value.clone(), nudge(*position, limits, rng))
                } else {
                    Self::insert(tweak_string(value, limits, rng), *position)
                }
            }
            Self::Delete { position, count } => {
                if rng.next_bool() {
                    Self::delete(nudge(*position, limits, rng), *count)
                } else {
                    Self::delete(*position, nudge(*count, limits, rng))
                }
            }
        }
    }
}

impl Modifiable for String {
    type Modification = StringModification;
    const KIND: &'static str = "string";

    fn random_modification(
        original: Option<&Self>,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> StringModification {
        catalog::text::random(original.map(String::as_str), limits, rng)
    }

    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self)
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn run(m: &StringModification, input: &str) -> String {
        m.apply(Some(input.to_string())).unwrap().unwrap()
    }

    #[test]
    fn test_append_prepend() {
        assert_eq!(run(&StringModification::append("!"), "hi"), "hi!");
        assert_eq!(run(&StringModification::prepend(">"), "hi"), ">hi");
    }

    #[test]
    fn test_insert_wraps_like_bytes() {
        assert_eq!(run(&StringModification::insert("X", 10), "abcd"), "Xabcd");
        assert_eq!(run(&StringModification::insert("X", 4), "abcd"), "abcdX");
        assert_eq!(run(&StringModification::insert("X", -1), "abcd"), "abcXd");
    }

    #[test]
    fn test_insert_counts_characters() {
        assert_eq!(run(&StringModification::insert("-", 1), "äö"), "ä-ö");
    }

    #[test]
    fn test_delete() {
        assert_eq!(run(&StringModification::delete(1, 2), "abcd"), "ad");
        assert_eq!(run(&StringModification::delete(-1, 1), "abcd"), "abc");
    }

    #[test]
    fn test_delete_out_of_range_is_inert() {
        assert_eq!(run(&StringModification::delete(5, 1), "abcd"), "abcd");
        assert_eq!(run(&StringModification::delete(2, 100), "abcd"), "abcd");
        assert_eq!(run(&StringModification::delete(-5, 1), "abcd"), "abcd");
        assert_eq!(run(&StringModification::delete(0, i64::MAX), "abcd"), "abcd");
        assert_eq!(run(&StringModification::delete(2, 2), "abcd"), "ab");
    }

    #[test]
    fn test_delete_negative_count_is_zero() {
        assert_eq!(run(&StringModification::delete(1, -3), "abcd"), "abcd");
    }

    #[test]
    fn test_delete_on_empty() {
        assert_eq!(run(&StringModification::delete(3, 1), ""), "");
    }

    #[test]
    fn test_delete_multibyte() {
        assert_eq!(run(&StringModification::delete(1, 1), "aßc"), "ac");
    }

    #[test]
    fn test_absent_original_policy() {
        assert_eq!(
            StringModification::append("a").apply(None).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(
            StringModification::prepend("b").apply(None).unwrap(),
            Some("b".to_string())
        );
        assert_eq!(StringModification::insert("c", 0).apply(None).unwrap(), None);
        assert_eq!(StringModification::delete(0, 1).apply(None).unwrap(), None);
        assert_eq!(
            StringModification::explicit_value("d").apply(None).unwrap(),
            Some("d".to_string())
        );
    }

    #[test]
    fn test_neighbor_keeps_variant() {
        let mut rng = StdRng::seed_from_u64(17);
        let limits = RandomLimits::default();
        let all = [
            StringModification::append(""),
            StringModification::prepend("x"),
            StringModification::insert("", 0),
            StringModification::delete(0, 0),
            StringModification::explicit_value(""),
        ];
        for m in &all {
            for _ in 0..20 {
                assert_eq!(m.random_neighbor(&limits, &mut rng).name(), m.name());
            }
        }
    }
}
