use super::{payload, pick, position_inclusive};
use crate::modification::BytesModification;
use crate::random::RandomSource;
use crate::types::RandomLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Append,
    Prepend,
    Insert,
    Delete,
    Xor,
    Shuffle,
    Duplicate,
    Payload,
    ExplicitValue,
}

const ANY_SHAPE: [Kind; 4] = [Kind::Append, Kind::Prepend, Kind::ExplicitValue, Kind::Payload];

const NON_EMPTY: [Kind; 9] = [
    Kind::Append,
    Kind::Prepend,
    Kind::Insert,
    Kind::Delete,
    Kind::Xor,
    Kind::Shuffle,
    Kind::Duplicate,
    Kind::Payload,
    Kind::ExplicitValue,
];

/// A byte-sequence modification sized for `original`.
///
/// Empty and absent originals only draw variants without a position; on a
/// non-empty original every position, count and key range is in bounds.
pub fn random(
    original: Option<&[u8]>,
    limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> BytesModification {
    let len = original.map_or(0, <[u8]>::len);
    let kind = if len == 0 {
        pick(&ANY_SHAPE, rng)
    } else {
        pick(&NON_EMPTY, rng)
    };

    match kind {
        Kind::Append => BytesModification::append(payload(limits, rng)),
        Kind::Prepend => BytesModification::prepend(payload(limits, rng)),
        Kind::Insert => {
            BytesModification::insert(payload(limits, rng), position_inclusive(len, rng))
        }
        Kind::Delete => {
            let start = rng.next_index(len);
            let count = 1 + rng.next_index(len - start);
            BytesModification::delete(start as i64, count as i64)
        }
        Kind::Xor => {
            let key_len = 1 + rng.next_index(limits.max_xor_key_len.max(1).min(len));
            let start = rng.next_index(len - key_len + 1);
            let mut key = rng.random_bytes(key_len, key_len);
            // A zero byte would leave its target unchanged.
            for b in key.iter_mut().filter(|b| **b == 0) {
                *b = 0xff;
            }
            BytesModification::xor(key, start as i64)
        }
        Kind::Shuffle => {
            let pairs = 1 + rng.next_index(limits.max_shuffle_pairs.max(1));
            let indices = (0..pairs * 2).map(|_| rng.next_uint(len as u64)).collect();
            BytesModification::shuffle(indices)
        }
        Kind::Duplicate => BytesModification::duplicate(),
        Kind::Payload => {
            let core = payload(limits, rng);
            let prepend = rng.random_bytes(0, limits.max_payload_len);
            let append = rng.random_bytes(0, limits.max_payload_len);
            if len > 0 && rng.next_bool() {
                BytesModification::payload_insert(
                    prepend,
                    core,
                    append,
                    position_inclusive(len, rng),
                )
            } else {
                BytesModification::payload(prepend, core, append)
            }
        }
        Kind::ExplicitValue => {
            BytesModification::explicit_value(rng.random_bytes(0, limits.max_payload_len))
        }
    }
}
