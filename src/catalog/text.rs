use super::{pick, position_inclusive, string};
use crate::modification::StringModification;
use crate::random::RandomSource;
use crate::types::RandomLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Append,
    Prepend,
    Insert,
    Delete,
    ExplicitValue,
}

const ANY_SHAPE: [Kind; 3] = [Kind::Append, Kind::Prepend, Kind::ExplicitValue];

const NON_EMPTY: [Kind; 5] = [
    Kind::Append,
    Kind::Prepend,
    Kind::Insert,
    Kind::Delete,
    Kind::ExplicitValue,
];

/// A text modification for `original`; positions count characters.
pub fn random(
    original: Option<&str>,
    limits: &RandomLimits,
    rng: &mut dyn RandomSource,
) -> StringModification {
    let len = original.map_or(0, |s| s.chars().count());
    let kind = if len == 0 {
        pick(&ANY_SHAPE, rng)
    } else {
        pick(&NON_EMPTY, rng)
    };
    match kind {
        Kind::Append => StringModification::append(string(limits, rng)),
        Kind::Prepend => StringModification::prepend(string(limits, rng)),
        Kind::Insert => StringModification::insert(string(limits, rng), position_inclusive(len, rng)),
        Kind::Delete => {
            let start = rng.next_index(len);
            let count = 1 + rng.next_index(len - start);
            StringModification::delete(start as i64, count as i64)
        }
        Kind::ExplicitValue => {
            StringModification::explicit_value(rng.random_string(0, limits.max_string_len))
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
    fn test_empty_text_has_no_positional_variants() {
        let mut rng = StdRng::seed_from_u64(31);
        let limits = RandomLimits::default();
        for original in [None, Some("")] {
            for _ in 0..100 {
                let m = random(original, &limits, &mut rng);
                assert!(
                    !matches!(
                        m,
                        StringModification::Insert { .. } | StringModification::Delete { .. }
                    ),
                    "{m:?}"
                );
            }
        }
    }

    #[test]
    fn test_delete_range_in_characters() {
        let mut rng = StdRng::seed_from_u64(32);
        let limits = RandomLimits::default();
        let original = "ääää";
        for _ in 0..500 {
            let m = random(Some(original), &limits, &mut rng);
            if let StringModification::Delete { position, count } = m {
                assert!(position >= 0 && count >= 1 && position + count <= 4);
                let out = m.apply(Some(original.to_string())).unwrap().unwrap();
                assert_eq!(out.chars().count() as i64, 4 - count);
            }
        }
    }
}
