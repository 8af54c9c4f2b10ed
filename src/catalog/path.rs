use super::{pick, repeat, string};
use crate::modification::path::Segments;
use crate::modification::{DelimitedPath, PathModification};
use crate::random::RandomSource;
use crate::types::RandomLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Append,
    Prepend,
    Insert,
    Delete,
    ExplicitValue,
    Traversal,
    Separator,
    ToggleRoot,
}

const NO_SEGMENTS: [Kind; 7] = [
    Kind::Append,
    Kind::Prepend,
    Kind::Insert,
    Kind::ExplicitValue,
    Kind::Traversal,
    Kind::Separator,
    Kind::ToggleRoot,
];

const WITH_SEGMENTS: [Kind; 8] = [
    Kind::Append,
    Kind::Prepend,
    Kind::Insert,
    Kind::Delete,
    Kind::ExplicitValue,
    Kind::Traversal,
    Kind::Separator,
    Kind::ToggleRoot,
];

/// A segment name: never empty, never containing the delimiter.
fn segment(limits: &RandomLimits, rng: &mut dyn RandomSource) -> String {
    string(limits, rng).replace('/', "_")
}

/// A path modification for `original`.
///
/// An absent path only draws `ExplicitValue`, the one variant that can give
/// it a value; the generated value is then absolute. Positions range over
/// segment indices; `Delete` is drawn only when there is a segment to remove.
pub fn random(
    original: Option<&DelimitedPath>,
    limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> PathModification {
    let Some(original) = original else {
        let mut value = String::from("/");
        value.push_str(&segment(limits, rng));
        return PathModification::explicit_value(value);
    };
    let segments = Segments::parse(original.as_str()).segments.len();
    let kind = if segments == 0 {
        pick(&NO_SEGMENTS, rng)
    } else {
        pick(&WITH_SEGMENTS, rng)
    };
    match kind {
        Kind::Append => PathModification::append(segment(limits, rng)),
        Kind::Prepend => PathModification::prepend(segment(limits, rng)),
        Kind::Insert => {
            let value = segment(limits, rng);
            PathModification::insert(value, rng.next_index(segments + 1) as i64)
        }
        Kind::Delete => {
            let start = rng.next_index(segments);
            let count = 1 + rng.next_index(segments - start);
            PathModification::delete(start as i64, count as i64)
        }
        Kind::ExplicitValue => PathModification::explicit_value(segment(limits, rng)),
        Kind::Traversal => PathModification::insert_directory_traversal(
            repeat(limits.max_path_repeat, rng),
            rng.next_index(segments + 1) as i64,
        ),
        Kind::Separator => PathModification::insert_directory_separator(
            repeat(limits.max_path_repeat, rng),
            rng.next_index(segments + 1) as i64,
        ),
        Kind::ToggleRoot => PathModification::toggle_root(),
    }
}
