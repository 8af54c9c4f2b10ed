use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::debug;

use crate::error::MutationError;
use crate::modification::DelimitedPath;
use crate::random::RandomSource;
use crate::types::RandomLimits;


// ─── Modification ───────────────────────────────────────────────────────────

/// One parameterized transform from `Option<T>` to `Option<T>`.
///
/// Equality is structural (variant + parameters). Each data kind has exactly
/// one implementing enum.
pub trait Modification<T>: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned {
    /// Stable snake_case variant name, matches the serialized `type` tag.
    fn name(&self) -> &'static str;

    /// Apply to the previous step's output. `None` is an absent value; what a
    /// variant does with it is part of that variant's contract.
    fn apply(&self, input: Option<T>) -> Result<Option<T>, MutationError>;

    /// Same variant, parameters moved a small random step.
    fn random_neighbor(&self, limits: &RandomLimits, rng: &mut dyn RandomSource) -> Self;
}

// ─── Modifiable ─────────────────────────────────────────────────────────────

/// A value kind that can live inside a [`MutationCell`].
pub trait Modifiable: Clone + PartialEq + fmt::Debug + 'static {
    type Modification: Modification<Self>;

    /// Short kind name ("bytes", "i32", "path", ...).
    const KIND: &'static str;

    /// Pick a fresh modification whose parameters fit `original`'s shape.
    fn random_modification(
        original: Option<&Self>,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> Self::Modification;

    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error>;
}

// ─── MutationCell ───────────────────────────────────────────────────────────

/// An original value plus an ordered chain of modifications.
///
/// The original is never touched by evaluation: [`value`](Self::value) folds
/// the chain over a copy. An optional expected value lets a test assert on
/// the computed result.
///
/// There is no internal synchronization. Build and mutate a cell from one
/// thread; once set up, shared `&MutationCell` reads are fine from anywhere
/// `T` allows.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationCell<T: Modifiable> {
    original: Option<T>,
    modifications: Vec<T::Modification>,
    expected: Option<T>,
}

pub type ModifiableBytes = MutationCell<Vec<u8>>;
pub type ModifiableI32 = MutationCell<i32>;
pub type ModifiableI64 = MutationCell<i64>;
pub type ModifiableU32 = MutationCell<u32>;
pub type ModifiableU64 = MutationCell<u64>;
pub type ModifiableString = MutationCell<String>;
pub type ModifiablePath = MutationCell<DelimitedPath>;
pub type ModifiableBool = MutationCell<bool>;
pub type ModifiableByte = MutationCell<u8>;

impl<T: Modifiable> Default for MutationCell<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Modifiable> From<T> for MutationCell<T> {
    fn from(original: T) -> Self {
        Self::new(original)
    }
}

impl<T: Modifiable> MutationCell<T> {
    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    pub fn new(original: T) -> Self {
        Self {
            original: Some(original),
            modifications: Vec::new(),
            expected: None,
        }
    }

    /// A cell without an original value.
    pub fn empty() -> Self {
        Self {
            original: None,
            modifications: Vec::new(),
            expected: None,
        }
    }

    pub fn with_modification(mut self, modification: T::Modification) -> Self {
        self.modifications.push(modification);
        self
    }

    // ════════════════════════════════════════════════════════════════════════
    // Accessors
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn original(&self) -> Option<&T> {
        self.original.as_ref()
    }

    pub fn set_original(&mut self, original: impl Into<Option<T>>) {
        self.original = original.into();
    }

    #[inline]
    pub fn modifications(&self) -> &[T::Modification] {
        &self.modifications
    }

    pub fn set_modifications(&mut self, modifications: Vec<T::Modification>) {
        self.modifications = modifications;
    }

    pub fn append_modification(&mut self, modification: T::Modification) {
        self.modifications.push(modification);
    }

    pub fn clear_modifications(&mut self) {
        self.modifications.clear();
    }

    #[inline]
    pub fn expected(&self) -> Option<&T> {
        self.expected.as_ref()
    }

    pub fn set_expected(&mut self, expected: T) {
        self.expected = Some(expected);
    }

    pub fn clear_expected(&mut self) {
        self.expected = None;
    }

    /// Drop the chain and the assertion, keep the original.
    pub fn reset(&mut self) {
        self.modifications.clear();
        self.expected = None;
    }

    // ════════════════════════════════════════════════════════════════════════
    // Evaluation
    // ════════════════════════════════════════════════════════════════════════

    /// Fold the chain left to right starting from the original.
    pub fn value(&self) -> Result<Option<T>, MutationError> {
        self.modifications
            .iter()
            .enumerate()
            .try_fold(self.original.clone(), |acc, (step, modification)| {
                modification.apply(acc).inspect_err(|e| {
                    debug!(
                        kind = T::KIND,
                        step,
                        modification = modification.name(),
                        error = %e,
                        "chain evaluation failed"
                    );
                })
            })
    }

    /// Content comparison of the computed value against the original.
    pub fn is_modified(&self) -> Result<bool, MutationError> {
        Ok(self.value()? != self.original)
    }

    /// `true` when no expected value is set, else whether it matches the computed value.
    pub fn validate_assertion(&self) -> Result<bool, MutationError> {
        match &self.expected {
            None => Ok(true),
            Some(expected) => Ok(self.value()?.as_ref() == Some(expected)),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Random modifications
    // ════════════════════════════════════════════════════════════════════════

    /// A fresh modification sized for the current original, with default limits.
    pub fn random_modification(&self, rng: &mut dyn RandomSource) -> T::Modification {
        self.random_modification_with(&RandomLimits::default(), rng)
    }

    pub fn random_modification_with(
        &self,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> T::Modification {
        T::random_modification(self.original.as_ref(), limits, rng)
    }

    /// Generate a modification and push it onto the chain.
    pub fn append_random_modification(
        &mut self,
        limits: &RandomLimits,
        rng: &mut dyn RandomSource,
    ) -> &T::Modification {
        let modification = self.random_modification_with(limits, rng);
        self.modifications.push(modification);
        &self.modifications[self.modifications.len() - 1]
    }
}

// ─── Serde ──────────────────────────────────────────────────────────────────

struct WireRef<'a, T>(&'a T);

impl<T: Modifiable> Serialize for WireRef<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize_value(serializer)
    }
}

struct WireOwned<T>(T);

impl<'de, T: Modifiable> Deserialize<'de> for WireOwned<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize_value(deserializer).map(WireOwned)
    }
}

impl<T: Modifiable> Serialize for MutationCell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MutationCell", 3)?;
        state.serialize_field("original", &self.original.as_ref().map(WireRef))?;
        state.serialize_field("modifications", &self.modifications)?;
        state.serialize_field("expected", &self.expected.as_ref().map(WireRef))?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(bound = "T: Modifiable")]
struct CellRepr<T: Modifiable> {
    #[serde(default)]
    original: Option<WireOwned<T>>,
    #[serde(default)]
    modifications: Vec<T::Modification>,
    #[serde(default)]
    expected: Option<WireOwned<T>>,
}

impl<'de, T: Modifiable> Deserialize<'de> for MutationCell<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = CellRepr::<T>::deserialize(deserializer)?;
        Ok(Self {
            original: repr.original.map(|w| w.0),
            modifications: repr.modifications,
            expected: repr.expected.map(|w| w.0),
        })
    }
}
