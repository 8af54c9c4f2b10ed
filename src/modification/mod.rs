pub mod bytes;
pub mod integer;
pub mod path;
pub mod scalar;
pub mod text;

pub use bytes::BytesModification;
pub use integer::{FixedWidth, IntegerModification};
pub use path::{DelimitedPath, PathModification};
pub use scalar::{BoolModification, ByteModification};
pub use text::StringModification;

use crate::random::RandomSource;
use crate::types::RandomLimits;

// ─── Wrap-around indexing ───────────────────────────────────────────────────

/// Insertion index into a sequence of `len` elements.
///
/// Negative positions count from the end, then the result wraps modulo
/// `len + 1` so that inserting exactly at the end is reachable.
#[inline]
pub(crate) fn wrap_insert_index(position: i64, len: usize) -> usize {
    let len = len as i64;
    let p = if position < 0 { position + len } else { position };
    p.rem_euclid(len + 1) as usize
}

/// Start index for a position-indexed operation, negative counting from the end.
/// `None` when the position is still negative afterwards.
#[inline]
pub(crate) fn resolve_start(position: i64, len: usize) -> Option<usize> {
    let p = if position < 0 {
        position + len as i64
    } else {
        position
    };
    usize::try_from(p).ok()
}

// ─── Neighbor helpers ───────────────────────────────────────────────────────

/// Move a position or count by a small random step.
#[inline]
pub(crate) fn nudge(value: i64, limits: &RandomLimits, rng: &mut dyn RandomSource) -> i64 {
    value.saturating_add(rng.next_signed(limits.max_position_step.max(1)))
}

/// Small random edit of a byte payload: flip a bit, grow by one, or shrink by one.
/// An empty payload always grows.
pub(crate) fn tweak_payload(
    value: &[u8],
    limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> Vec<u8> {
    let mut out = value.to_vec();
    if out.is_empty() {
        out.extend(rng.random_bytes(1, 1));
        return out;
    }
    match rng.next_uint(3) {
        0 if out.len() < limits.max_payload_len.max(1) => out.extend(rng.random_bytes(1, 1)),
        1 if out.len() > 1 => {
            out.pop();
        }
        _ => {
            let idx = rng.next_index(out.len());
            out[idx] ^= 1 << rng.next_uint(8);
        }
    }
    out
}

/// Character-level counterpart of [`tweak_payload`].
pub(crate) fn tweak_string(value: &str, limits: &RandomLimits, rng: &mut dyn RandomSource) -> String {
    let mut chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return rng.random_string(1, 1);
    }
    match rng.next_uint(3) {
        0 if chars.len() < limits.max_string_len.max(1) => {
            chars.extend(rng.random_string(1, 1).chars());
        }
        1 if chars.len() > 1 => {
            chars.pop();
        }
        _ => {
            let idx = rng.next_index(chars.len());
            chars[idx] = rng.random_string(1, 1).chars().next().unwrap_or('a');
        }
    }
    chars.into_iter().collect()
}
