use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use super::{nudge, resolve_start, tweak_payload, wrap_insert_index};
use crate::catalog;
use crate::cell::{Modifiable, Modification};
use crate::error::MutationError;
use crate::random::RandomSource;
use crate::types::RandomLimits;

// ─── BytesModification ──────────────────────────────────────────────────────

/// Transforms over byte sequences.
///
/// Every transform returns a new buffer. Malformed positions or counts leave
/// the input untouched instead of failing.
///
/// | Variant         | Absent original          |
/// |-----------------|--------------------------|
/// | `Append`        | treated as empty         |
/// | `Prepend`       | treated as empty         |
/// | `Insert`        | treated as empty         |
/// | `Payload`       | treated as empty         |
/// | `Delete`        | stays absent             |
/// | `Xor`           | stays absent             |
/// | `Shuffle`       | stays absent             |
/// | `Duplicate`     | stays absent             |
/// | `ExplicitValue` | ignored                  |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BytesModification {
    Append {
        #[serde(with = "crate::hex_codec")]
        value: Vec<u8>,
    },
    Prepend {
        #[serde(with = "crate::hex_codec")]
        value: Vec<u8>,
    },
    Insert {
        #[serde(with = "crate::hex_codec")]
        value: Vec<u8>,
        position: i64,
    },
    Delete {
        position: i64,
        count: i64,
    },
    Xor {
        #[serde(with = "crate::hex_codec")]
        key: Vec<u8>,
        position: i64,
    },
    /// Index pairs, swapped in order. A trailing odd index is ignored.
    Shuffle {
        indices: Vec<u64>,
    },
    Duplicate,
    /// `prepend ++ core ++ append`, either replacing the input or inserted into it.
    Payload {
        #[serde(with = "crate::hex_codec")]
        prepend: Vec<u8>,
        #[serde(with = "crate::hex_codec")]
        core: Vec<u8>,
        #[serde(with = "crate::hex_codec")]
        append: Vec<u8>,
        insert: bool,
        insert_position: i64,
    },
    ExplicitValue {
        #[serde(with = "crate::hex_codec")]
        value: Vec<u8>,
    },
}

impl BytesModification {
    pub fn append(value: impl Into<Vec<u8>>) -> Self {
        Self::Append {
            value: value.into(),
        }
    }

    pub fn prepend(value: impl Into<Vec<u8>>) -> Self {
        Self::Prepend {
            value: value.into(),
        }
    }

    pub fn insert(value: impl Into<Vec<u8>>, position: i64) -> Self {
        Self::Insert {
            value: value.into(),
            position,
        }
    }

    pub fn delete(position: i64, count: i64) -> Self {
        Self::Delete { position, count }
    }

    pub fn xor(key: impl Into<Vec<u8>>, position: i64) -> Self {
        Self::Xor {
            key: key.into(),
            position,
        }
    }

    pub fn shuffle(indices: Vec<u64>) -> Self {
        Self::Shuffle { indices }
    }

    pub fn duplicate() -> Self {
        Self::Duplicate
    }

    /// Replace the input with `prepend ++ core ++ append`.
    pub fn payload(
        prepend: impl Into<Vec<u8>>,
        core: impl Into<Vec<u8>>,
        append: impl Into<Vec<u8>>,
    ) -> Self {
        Self::Payload {
            prepend: prepend.into(),
            core: core.into(),
            append: append.into(),
            insert: false,
            insert_position: 0,
        }
    }

    /// Splice `prepend ++ core ++ append` into the input at `position`.
    pub fn payload_insert(
        prepend: impl Into<Vec<u8>>,
        core: impl Into<Vec<u8>>,
        append: impl Into<Vec<u8>>,
        position: i64,
    ) -> Self {
        Self::Payload {
            prepend: prepend.into(),
            core: core.into(),
            append: append.into(),
            insert: true,
            insert_position: position,
        }
    }

    pub fn explicit_value(value: impl Into<Vec<u8>>) -> Self {
        Self::ExplicitValue {
            value: value.into(),
        }
    }
}

// ─── Algorithms ─────────────────────────────────────────────────────────────

pub fn append(input: &[u8], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + value.len());
    out.extend_from_slice(input);
    out.extend_from_slice(value);
    out
}

pub fn prepend(input: &[u8], value: &[u8]) -> Vec<u8> {
    append(value, input)
}

/// Splice `value` in at `position`, wrapped into `0..=len`.
pub fn insert(input: &[u8], value: &[u8], position: i64) -> Vec<u8> {
    let idx = wrap_insert_index(position, input.len());
    let mut out = Vec::with_capacity(input.len() + value.len());
    out.extend_from_slice(&input[..idx]);
    out.extend_from_slice(value);
    out.extend_from_slice(&input[idx..]);
    out
}

/// Remove `[position, position + count)`; inert unless that range is fully in bounds.
pub fn delete(input: &[u8], position: i64, count: i64) -> Vec<u8> {
    let start = match resolve_start(position, input.len()) {
        Some(start) if count > 0 => start,
        _ => {
            trace!(position, count, len = input.len(), "delete is inert");
            return input.to_vec();
        }
    };
    let end = match start.checked_add(count as usize) {
        Some(end) if end <= input.len() => end,
        _ => {
            trace!(position, count, len = input.len(), "delete is inert");
            return input.to_vec();
        }
    };
    let mut out = Vec::with_capacity(input.len() - (end - start));
    out.extend_from_slice(&input[..start]);
    out.extend_from_slice(&input[end..]);
    out
}

/// XOR `key` over `[position, position + key.len())`; inert unless fully in bounds.
pub fn xor(input: &[u8], key: &[u8], position: i64) -> Vec<u8> {
    let Some(start) = resolve_start(position, input.len())
        .filter(|start| start.saturating_add(key.len()) <= input.len())
    else {
        trace!(position, key_len = key.len(), len = input.len(), "xor is inert");
        return input.to_vec();
    };
    let mut out = input.to_vec();
    for (b, k) in out[start..start + key.len()].iter_mut().zip(key) {
        *b ^= k;
    }
    out
}

/// Swap `indices` pairwise, each index taken modulo the length.
pub fn shuffle(input: &[u8], indices: &[u64]) -> Vec<u8> {
    let mut out = input.to_vec();
    if out.is_empty() {
        return out;
    }
    let len = out.len() as u64;
    for pair in indices.chunks_exact(2) {
        out.swap((pair[0] % len) as usize, (pair[1] % len) as usize);
    }
    out
}

pub fn duplicate(input: &[u8]) -> Vec<u8> {
    append(input, input)
}

pub fn payload(
    input: &[u8],
    prepend: &[u8],
    core: &[u8],
    append: &[u8],
    insert_into_input: bool,
    insert_position: i64,
) -> Vec<u8> {
    let mut composed = Vec::with_capacity(prepend.len() + core.len() + append.len());
    composed.extend_from_slice(prepend);
    composed.extend_from_slice(core);
    composed.extend_from_slice(append);
    if insert_into_input {
        insert(input, &composed, insert_position)
    } else {
        composed
    }
}

// ─── Modification impl ──────────────────────────────────────────────────────

impl Modification<Vec<u8>> for BytesModification {
    fn name(&self) -> &'static str {
        match self {
            Self::Append { .. } => "append",
            Self::Prepend { .. } => "prepend",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Xor { .. } => "xor",
            Self::Shuffle { .. } => "shuffle",
            Self::Duplicate => "duplicate",
            Self::Payload { .. } => "payload",
            Self::ExplicitValue { .. } => "explicit_value",
        }
    }

    fn apply(&self, input: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, MutationError> {
        let out = match self {
            Self::ExplicitValue { value } => value.clone(),
            Self::Append { value } => append(input.as_deref().unwrap_or_default(), value),
            Self::Prepend { value } => prepend(input.as_deref().unwrap_or_default(), value),
            Self::Insert { value, position } => {
                insert(input.as_deref().unwrap_or_default(), value, *position)
            }
            Self::Payload {
                prepend,
                core,
                append,
                insert,
                insert_position,
            } => payload(
                input.as_deref().unwrap_or_default(),
                prepend,
                core,
                append,
                *insert,
                *insert_position,
            ),
            Self::Delete { position, count } => match input {
                Some(input) => delete(&input, *position, *count),
                None => return Ok(None),
            },
            Self::Xor { key, position } => match input {
                Some(input) => xor(&input, key, *position),
                None => return Ok(None),
            },
            Self::Shuffle { indices } => match input {
                Some(input) => shuffle(&input, indices),
                None => return Ok(None),
            },
            Self::Duplicate => match input {
                Some(input) => duplicate(&input),
                None => return Ok(None),
            },
        };
        Ok(Some(out))
    }

    fn random_neighbor(&self, limits: &RandomLimits, rng: &mut dyn RandomSource) -> Self {
        match self {
            Self::Append { value } => Self::append(tweak_payload(value, limits, rng)),
            Self::Prepend { value } => Self::prepend(tweak_payload(value, limits, rng)),
            Self::ExplicitValue { value } => Self::explicit_value(tweak_payload(value, limits, rng)),
            Self::Insert { value, position } => {
                if rng.next_bool() {
                    Self::insert(value.clone(), nudge(*position, limits, rng))
                } else {
                    Self::insert(tweak_payload(value, limits, rng), *position)
                }
            }
            Self::Delete { position, count } => {
                if rng.next_bool() {
                    Self::delete(nudge(*position, limits, rng), *count)
                } else {
                    Self::delete(*position, nudge(*count, limits, rng))
                }
            }
            Self::Xor { key, position } => {
                if rng.next_bool() {
                    Self::xor(key.clone(), nudge(*position, limits, rng))
                } else {
                    Self::xor(tweak_payload(key, limits, rng), *position)
                }
            }
            Self::Shuffle { indices } => {
                let mut indices = indices.clone();
                if indices.is_empty() {
                    let bound = limits.max_payload_len.max(1) as u64;
                    indices.push(rng.next_uint(bound));
                    indices.push(rng.next_uint(bound));
                } else {
                    let idx = rng.next_index(indices.len());
                    let moved = nudge(indices[idx] as i64, limits, rng);
                    indices[idx] = moved.max(0) as u64;
                }
                Self::Shuffle { indices }
            }
            Self::Duplicate => Self::Duplicate,
            Self::Payload {
                prepend,
                core,
                append,
                insert,
                insert_position,
            } => {
                let (core, insert_position) = if *insert && rng.next_bool() {
                    (core.clone(), nudge(*insert_position, limits, rng))
                } else {
                    (tweak_payload(core, limits, rng), *insert_position)
                };
                Self::Payload {
                    prepend: prepend.clone(),
                    core,
                    append: append.clone(),
                    insert: *insert,
                    insert_position,
                }
            }
        }
    }
}

// ─── Modifiable ─────────────────────────────────────────────────────────────

impl Modifiable for Vec<u8> {
    type Modification = BytesModification;
    const KIND: &'static str = "bytes";

    fn random_modification(
        original: Option<&Self>,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> BytesModification {
        catalog::bytes::random(original.map(Vec::as_slice), limits, rng)
    }

    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::hex_codec::serialize(self, serializer)
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::hex_codec::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EMPTY: [u8; 0] = [];

    fn run(m: &BytesModification, input: &[u8]) -> Vec<u8> {
        m.apply(Some(input.to_vec())).unwrap().unwrap()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Append / prepend / duplicate
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_append_and_prepend() {
        assert_eq!(run(&BytesModification::append([9, 9]), &[1, 2]), vec![1, 2, 9, 9]);
        assert_eq!(run(&BytesModification::prepend([9]), &[1, 2]), vec![9, 1, 2]);
    }

    #[test]
    fn test_duplicate() {
        assert_eq!(
            run(&BytesModification::duplicate(), &[1, 2, 3]),
            vec![1, 2, 3, 1, 2, 3]
        );
        assert!(run(&BytesModification::duplicate(), &[]).is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Insert
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_insert_wraps_around() {
        let m = BytesModification::insert([0xAA], 10);
        assert_eq!(run(&m, &[1, 2, 3, 4]), vec![0xAA, 1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_at_exact_end() {
        let m = BytesModification::insert([0xAA], 4);
        assert_eq!(run(&m, &[1, 2, 3, 4]), vec![1, 2, 3, 4, 0xAA]);
    }

    #[test]
    fn test_insert_negative_counts_from_end() {
        let m = BytesModification::insert([0xAA], -1);
        assert_eq!(run(&m, &[1, 2, 3, 4]), vec![1, 2, 3, 0xAA, 4]);
        let m = BytesModification::insert([0xAA], -10);
        assert_eq!(run(&m, &[1, 2, 3, 4]), vec![1, 2, 3, 4, 0xAA]);
    }

    #[test]
    fn test_insert_into_empty() {
        let m = BytesModification::insert([7, 8], 3);
        assert_eq!(run(&m, &[]), vec![7, 8]);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Delete
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_delete_range() {
        assert_eq!(run(&BytesModification::delete(1, 2), &[1, 2, 3, 4]), vec![1, 4]);
        assert_eq!(run(&BytesModification::delete(-2, 2), &[1, 2, 3, 4]), vec![1, 2]);
        assert_eq!(run(&BytesModification::delete(0, 4), &[1, 2, 3, 4]), Vec::<u8>::new());
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        assert_eq!(run(&BytesModification::delete(100, 1), &[1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(run(&BytesModification::delete(2, 2), &[1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(run(&BytesModification::delete(-4, 1), &[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_delete_non_positive_count_is_noop() {
        assert_eq!(run(&BytesModification::delete(0, 0), &[1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(run(&BytesModification::delete(0, -2), &[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_delete_huge_count_is_noop() {
        assert_eq!(
            run(&BytesModification::delete(1, i64::MAX), &[1, 2, 3]),
            vec![1, 2, 3]
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Xor
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_xor_in_bounds() {
        let m = BytesModification::xor([0xFF, 0x0F], 1);
        assert_eq!(run(&m, &[0, 0, 0, 0]), vec![0, 0xFF, 0x0F, 0]);
    }

    #[test]
    fn test_xor_is_self_inverse() {
        let input = vec![0x10, 0x20, 0x30, 0x40, 0x50];
        let m = BytesModification::xor([0xDE, 0xAD], 3);
        let once = run(&m, &input);
        assert_ne!(once, input);
        assert_eq!(run(&m, &once), input);
    }

    #[test]
    fn test_xor_negative_position() {
        let m = BytesModification::xor([0x01], -1);
        assert_eq!(run(&m, &[0, 0, 0]), vec![0, 0, 1]);
    }

    #[test]
    fn test_xor_out_of_bounds_is_noop() {
        assert_eq!(run(&BytesModification::xor([1, 1], 2), &[5, 5, 5]), vec![5, 5, 5]);
        assert_eq!(run(&BytesModification::xor([1], -4), &[5, 5, 5]), vec![5, 5, 5]);
        assert_eq!(run(&BytesModification::xor([1; 4], 0), &[5, 5, 5]), vec![5, 5, 5]);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Shuffle
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_shuffle_pairs() {
        let m = BytesModification::shuffle(vec![0, 1, 2, 3]);
        assert_eq!(run(&m, &[1, 2, 3, 4]), vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_shuffle_wraps_and_ignores_trailing_index() {
        let m = BytesModification::shuffle(vec![4, 6, 1]);
        assert_eq!(run(&m, &[1, 2, 3, 4]), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_shuffle_empty_input() {
        let m = BytesModification::shuffle(vec![0, 1]);
        assert!(run(&m, &[]).is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Payload / explicit
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_payload_replaces_input() {
        let m = BytesModification::payload([1], [2, 2], [3]);
        assert_eq!(run(&m, &[9, 9, 9]), vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_payload_inserts_into_input() {
        let m = BytesModification::payload_insert([1], [2], [3], 1);
        assert_eq!(run(&m, &[9, 9]), vec![9, 1, 2, 3, 9]);
        let m = BytesModification::payload_insert(EMPTY, [2], EMPTY, 7);
        assert_eq!(run(&m, &[9, 9]), vec![9, 2, 9]);
    }

    #[test]
    fn test_explicit_value() {
        let m = BytesModification::explicit_value([4, 2]);
        assert_eq!(run(&m, &[1, 2, 3]), vec![4, 2]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = vec![1, 2, 3];
        let _ = xor(&input, &[1], 0);
        let _ = shuffle(&input, &[0, 2]);
        assert_eq!(input, vec![1, 2, 3]);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Absent original
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_absent_treated_as_empty() {
        let cases = [
            (BytesModification::append([1]), vec![1]),
            (BytesModification::prepend([2]), vec![2]),
            (BytesModification::insert([3], 5), vec![3]),
            (BytesModification::payload_insert([4], [5], EMPTY, 2), vec![4, 5]),
            (BytesModification::payload(EMPTY, [6], EMPTY), vec![6]),
        ];
        for (m, expected) in cases {
            assert_eq!(m.apply(None).unwrap(), Some(expected), "{}", m.name());
        }
    }

    #[test]
    fn test_absent_propagates() {
        let cases = [
            BytesModification::delete(0, 1),
            BytesModification::xor([1], 0),
            BytesModification::shuffle(vec![0, 1]),
            BytesModification::duplicate(),
        ];
        for m in cases {
            assert_eq!(m.apply(None).unwrap(), None, "{}", m.name());
        }
    }

    #[test]
    fn test_absent_explicit_value_is_set() {
        let m = BytesModification::explicit_value([1, 2]);
        assert_eq!(m.apply(None).unwrap(), Some(vec![1, 2]));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Random neighbor
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_neighbor_keeps_variant() {
        let mut rng = StdRng::seed_from_u64(42);
        let limits = RandomLimits::default();
        let all = [
            BytesModification::append([1]),
            BytesModification::prepend([1]),
            BytesModification::insert([1], 0),
            BytesModification::delete(0, 1),
            BytesModification::xor([1], 0),
            BytesModification::shuffle(vec![0, 1]),
            BytesModification::duplicate(),
            BytesModification::payload_insert([1], [2], [3], 0),
            BytesModification::explicit_value([1]),
        ];
        for m in &all {
            for _ in 0..20 {
                assert_eq!(m.random_neighbor(&limits, &mut rng).name(), m.name());
            }
        }
    }

    #[test]
    fn test_neighbor_handles_empty_parameters() {
        let mut rng = StdRng::seed_from_u64(1);
        let limits = RandomLimits::default();
        let empties = [
            BytesModification::append(EMPTY),
            BytesModification::xor(EMPTY, 0),
            BytesModification::shuffle(vec![]),
            BytesModification::payload(EMPTY, EMPTY, EMPTY),
            BytesModification::explicit_value(EMPTY),
        ];
        for m in &empties {
            for _ in 0..50 {
                let _ = m.random_neighbor(&limits, &mut rng);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Serialization shape
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_serialized_shape() {
        let m = BytesModification::xor([0xde, 0xad], -1);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"type":"xor","key":"dead","position":-1}"#);

        let back: BytesModification =
            serde_json::from_str(r#"{"type":"xor","key":"DE AD\n","position":-1}"#).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_unit_variant_shape() {
        let json = serde_json::to_string(&BytesModification::duplicate()).unwrap();
        assert_eq!(json, r#"{"type":"duplicate"}"#);
    }
}
