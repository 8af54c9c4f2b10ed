use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter;
use tracing::trace;

use super::{nudge, tweak_string};
use crate::catalog;
use crate::cell::{Modifiable, Modification};
use crate::error::MutationError;
use crate::random::RandomSource;
use crate::types::{MAX_GENERATED_LEN, RandomLimits};

// ─── DelimitedPath ──────────────────────────────────────────────────────────

/// A `/`-delimited path as carried in a protocol field (URI path, file name).
///
/// Kept as raw text; no normalization happens on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelimitedPath(String);

impl DelimitedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }
}

impl fmt::Display for DelimitedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DelimitedPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DelimitedPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── Segments ───────────────────────────────────────────────────────────────
//
//  "/usr/lib/"   absolute = true, segments = ["usr", "lib"], trailing = true
//  "a//b"        absolute = false, segments = ["a", "", "b"], trailing = false
//  "/"           absolute = true, segments = [], trailing = false
//  "//"          absolute = true, segments = [""], trailing = true
//
// Splitting an absolute path on '/' yields a synthetic empty first part
// before the root; `segments` excludes it, the absolute index formulas
// below count it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segments {
    pub absolute: bool,
    pub trailing_slash: bool,
    pub segments: Vec<String>,
}

impl Segments {
    pub fn parse(input: &str) -> Self {
        let absolute = input.starts_with('/');
        let body = if absolute { &input[1..] } else { input };
        let (body, trailing_slash) = match body.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (body, false),
        };
        // A slash after the root always closes a (possibly empty) segment.
        let segments = if body.is_empty() && !trailing_slash {
            Vec::new()
        } else {
            body.split('/').map(str::to_string).collect()
        };
        Self {
            absolute,
            trailing_slash,
            segments,
        }
    }

    pub fn join(&self) -> String {
        let mut out = String::new();
        if self.absolute {
            out.push('/');
        }
        out.push_str(&self.segments.join("/"));
        if self.trailing_slash && !self.segments.is_empty() {
            out.push('/');
        }
        out
    }

    /// Segment index a new segment is inserted before (`len` = at the end).
    pub fn insert_index(&self, position: i64) -> usize {
        let n = self.segments.len() as i64;
        if self.absolute {
            // Index into the split parts, past the synthetic empty first part.
            let parts = n + 1;
            let p = if position < 0 {
                position + (parts - 1)
            } else {
                position
            };
            let part_index = p.rem_euclid(parts) + 1;
            (part_index - 1) as usize
        } else {
            let p = if position < 0 { position + n } else { position };
            p.rem_euclid(n + 1) as usize
        }
    }

    /// Segment index a delete starts at; `None` when there are no segments.
    pub fn delete_index(&self, position: i64) -> Option<usize> {
        let n = self.segments.len() as i64;
        if n == 0 {
            return None;
        }
        let idx = if self.absolute {
            let parts = n + 1;
            let p = if position < 0 {
                position + (parts - 1)
            } else {
                position
            };
            let part_index = p.rem_euclid(parts - 1) + 1;
            (part_index - 1) as usize
        } else {
            let p = if position < 0 { position + n } else { position };
            p.rem_euclid(n) as usize
        };
        Some(idx)
    }

    /// Byte offset in [`join`](Self::join)'s output where segment `idx` starts.
    /// `idx == len` is the end of the last segment, before any trailing slash.
    fn byte_offset(&self, idx: usize) -> usize {
        let mut offset = usize::from(self.absolute);
        for (i, segment) in self.segments.iter().enumerate() {
            if i == idx {
                return offset;
            }
            offset += segment.len();
            if i + 1 < self.segments.len() {
                offset += 1;
            }
        }
        offset
    }
}

// ─── Algorithms ─────────────────────────────────────────────────────────────

/// Insert `value` as a new segment at the wrapped segment position.
pub fn insert(input: &str, value: &str, position: i64) -> String {
    let mut parts = Segments::parse(input);
    let idx = parts.insert_index(position);
    parts.segments.insert(idx, value.to_string());
    parts.join()
}

pub fn append(input: &str, value: &str) -> String {
    let mut parts = Segments::parse(input);
    parts.segments.push(value.to_string());
    parts.join()
}

/// New first segment; the root of an absolute path stays in front.
pub fn prepend(input: &str, value: &str) -> String {
    let mut parts = Segments::parse(input);
    parts.segments.insert(0, value.to_string());
    parts.join()
}

/// Remove up to `count` segments from the wrapped start. Negative counts clamp to zero.
pub fn delete(input: &str, position: i64, count: i64) -> String {
    let mut parts = Segments::parse(input);
    let Some(start) = parts.delete_index(position).filter(|_| count > 0) else {
        return input.to_string();
    };
    let end = start
        .saturating_add(count as usize)
        .min(parts.segments.len());
    parts.segments.drain(start..end);
    parts.join()
}

/// Repeat count for the injecting generators: `None` (inert) unless in
/// `1..=MAX_GENERATED_LEN`.
fn injected_count(count: i64) -> Option<usize> {
    let repeat = usize::try_from(count)
        .ok()
        .filter(|repeat| (1..=MAX_GENERATED_LEN).contains(repeat));
    if repeat.is_none() {
        trace!(count, "path injection count out of range");
    }
    repeat
}

/// Insert `count` `..` segments at the wrapped segment position.
pub fn insert_directory_traversal(input: &str, count: i64, position: i64) -> String {
    let Some(count) = injected_count(count) else {
        return input.to_string();
    };
    let mut parts = Segments::parse(input);
    let idx = parts.insert_index(position);
    parts
        .segments
        .splice(idx..idx, iter::repeat_n("..".to_string(), count));
    parts.join()
}

/// Insert `count` extra `/` in front of the wrapped segment position.
pub fn insert_directory_separator(input: &str, count: i64, position: i64) -> String {
    let Some(count) = injected_count(count) else {
        return input.to_string();
    };
    let parts = Segments::parse(input);
    let idx = parts.insert_index(position);
    let mut out = parts.join();
    out.insert_str(parts.byte_offset(idx), &"/".repeat(count));
    out
}

/// Remove exactly one leading `/`, or add one.
pub fn toggle_root(input: &str) -> String {
    match input.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => format!("/{input}"),
    }
}

fn repeat_count(count: i64, limits: &RandomLimits, rng: &mut dyn RandomSource) -> i64 {
    let max = i64::try_from(limits.max_path_repeat.max(1)).unwrap_or(i64::MAX);
    nudge(count, limits, rng).clamp(1, max)
}

// ─── PathModification ───────────────────────────────────────────────────────

/// Segment-aware transforms over [`DelimitedPath`].
///
/// Every variant except `ExplicitValue` leaves an absent original absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathModification {
    Append { value: String },
    Prepend { value: String },
    Insert { value: String, position: i64 },
    Delete { position: i64, count: i64 },
    ExplicitValue { value: String },
    InsertDirectoryTraversal { count: i64, position: i64 },
    InsertDirectorySeparator { count: i64, position: i64 },
    ToggleRoot,
}

impl PathModification {
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

    pub fn insert_directory_traversal(count: i64, position: i64) -> Self {
        Self::InsertDirectoryTraversal { count, position }
    }

    pub fn insert_directory_separator(count: i64, position: i64) -> Self {
        Self::InsertDirectorySeparator { count, position }
    }

    pub fn toggle_root() -> Self {
        Self::ToggleRoot
    }
}

impl Modification<DelimitedPath> for PathModification {
    fn name(&self) -> &'static str {
        match self {
            Self::Append { .. } => "append",
            Self::Prepend { .. } => "prepend",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::ExplicitValue { .. } => "explicit_value",
            Self::InsertDirectoryTraversal { .. } => "insert_directory_traversal",
            Self::InsertDirectorySeparator { .. } => "insert_directory_separator",
            Self::ToggleRoot => "toggle_root",
        }
    }

    fn apply(&self, input: Option<DelimitedPath>) -> Result<Option<DelimitedPath>, MutationError> {
        if let Self::ExplicitValue { value } = self {
            return Ok(Some(DelimitedPath::new(value.clone())));
        }
        let Some(input) = input else {
            return Ok(None);
        };
        let input = input.as_str();
        let out = match self {
            Self::Append { value } => append(input, value),
            Self::Prepend { value } => prepend(input, value),
            Self::Insert { value, position } => insert(input, value, *position),
            Self::Delete { position, count } => delete(input, *position, *count),
            Self::InsertDirectoryTraversal { count, position } => {
                insert_directory_traversal(input, *count, *position)
            }
            Self::InsertDirectorySeparator { count, position } => {
                insert_directory_separator(input, *count, *position)
            }
            Self::ToggleRoot => toggle_root(input),
            Self::ExplicitValue { value } => value.clone(),
        };
        Ok(Some(DelimitedPath(out)))
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
            Self::InsertDirectoryTraversal { count, position } => {
                if rng.next_bool() {
                    Self::insert_directory_traversal(repeat_count(*count, limits, rng), *position)
                } else {
                    Self::insert_directory_traversal(*count, nudge(*position, limits, rng))
                }
            }
            Self::InsertDirectorySeparator { count, position } => {
                if rng.next_bool() {
                    Self::insert_directory_separator(repeat_count(*count, limits, rng), *position)
                } else {
                    Self::insert_directory_separator(*count, nudge(*position, limits, rng))
                }
            }
            Self::ToggleRoot => Self::ToggleRoot,
        }
    }
}

impl Modifiable for DelimitedPath {
    type Modification = PathModification;
    const KIND: &'static str = "path";

    fn random_modification(
        original: Option<&Self>,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> PathModification {
        catalog::path::random(original, limits, rng)
    }

    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(DelimitedPath)
    }
}
