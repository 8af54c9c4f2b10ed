use std::any::Any;
use std::cell::OnceCell;
use std::rc::Rc;

use crate::cell::{Modifiable, MutationCell};
use crate::error::MutationError;
use crate::random::RandomSource;
use crate::types::RandomLimits;

// ─── AnyCell ────────────────────────────────────────────────────────────────

/// Type-erased view of a [`MutationCell`], so a discovered cell can be
/// inspected and mutated without naming its value type.
pub trait AnyCell {
    fn kind(&self) -> &'static str;
    fn has_original(&self) -> bool;
    fn modification_count(&self) -> usize;
    fn is_modified(&self) -> Result<bool, MutationError>;
    fn validate_assertion(&self) -> Result<bool, MutationError>;
    fn clear_modifications(&mut self);
    fn append_random_modification(&mut self, limits: &RandomLimits, rng: &mut dyn RandomSource);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Modifiable> AnyCell for MutationCell<T> {
    #[inline]
    fn kind(&self) -> &'static str {
        T::KIND
    }

    #[inline]
    fn has_original(&self) -> bool {
        self.original().is_some()
    }

    #[inline]
    fn modification_count(&self) -> usize {
        self.modifications().len()
    }

    fn is_modified(&self) -> Result<bool, MutationError> {
        MutationCell::is_modified(self)
    }

    fn validate_assertion(&self) -> Result<bool, MutationError> {
        MutationCell::validate_assertion(self)
    }

    fn clear_modifications(&mut self) {
        MutationCell::clear_modifications(self);
    }

    fn append_random_modification(&mut self, limits: &RandomLimits, rng: &mut dyn RandomSource) {
        MutationCell::append_random_modification(self, limits, rng);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ─── CellField ──────────────────────────────────────────────────────────────

/// A struct field that may hold a cell: a plain cell, or an optional one.
pub trait CellField {
    fn as_cell(&self) -> Option<&dyn AnyCell>;
    fn as_cell_mut(&mut self) -> Option<&mut dyn AnyCell>;
}

impl<T: Modifiable> CellField for MutationCell<T> {
    #[inline]
    fn as_cell(&self) -> Option<&dyn AnyCell> {
        Some(self)
    }

    #[inline]
    fn as_cell_mut(&mut self) -> Option<&mut dyn AnyCell> {
        Some(self)
    }
}

impl<T: Modifiable> CellField for Option<MutationCell<T>> {
    fn as_cell(&self) -> Option<&dyn AnyCell> {
        self.as_ref().map(|cell| cell as &dyn AnyCell)
    }

    fn as_cell_mut(&mut self) -> Option<&mut dyn AnyCell> {
        self.as_mut().map(|cell| cell as &mut dyn AnyCell)
    }
}

// ─── Holder ─────────────────────────────────────────────────────────────────

/// An object whose fields are cells and/or further holders.
///
/// Implement with the [`holder!`](crate::holder) macro. Slots are reported in
/// declaration order; the graph walk relies on that order being stable.
pub trait Holder {
    /// Present cell fields, by field name. Empty optional cells are skipped.
    fn cell_slots(&self) -> Vec<(&'static str, &dyn AnyCell)>;

    /// Fields that lead to more holders.
    fn nested_slots(&self) -> Vec<(&'static str, &dyn NestedHolders)>;

    fn cell_slot_mut(&mut self, field: &str) -> Option<&mut dyn AnyCell>;

    fn nested_slot_mut(&mut self, field: &str) -> Option<&mut dyn NestedHolders>;

    fn holder_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ─── NestedHolders ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestedShape {
    /// At most one holder (a struct field, `Option`, `Box`, `Rc`, `OnceCell`).
    Single,
    Sequence,
    Array,
}

/// A field that yields zero or more holders, in element order.
pub trait NestedHolders {
    fn shape(&self) -> NestedShape;
    fn holders(&self) -> Vec<&dyn Holder>;
    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder>;
}

impl<N: NestedHolders> NestedHolders for Option<N> {
    fn shape(&self) -> NestedShape {
        self.as_ref().map_or(NestedShape::Single, N::shape)
    }

    fn holders(&self) -> Vec<&dyn Holder> {
        self.as_ref().map_or_else(Vec::new, N::holders)
    }

    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder> {
        self.as_mut()?.holder_mut(index)
    }
}

impl<N: NestedHolders + ?Sized> NestedHolders for Box<N> {
    fn shape(&self) -> NestedShape {
        (**self).shape()
    }

    fn holders(&self) -> Vec<&dyn Holder> {
        (**self).holders()
    }

    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder> {
        (**self).holder_mut(index)
    }
}

/// Mutable access only while the `Rc` is the sole owner.
impl<N: NestedHolders + ?Sized> NestedHolders for Rc<N> {
    fn shape(&self) -> NestedShape {
        (**self).shape()
    }

    fn holders(&self) -> Vec<&dyn Holder> {
        (**self).holders()
    }

    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder> {
        Rc::get_mut(self)?.holder_mut(index)
    }
}

/// Lets an already-built graph close a cycle after construction.
impl<N: NestedHolders> NestedHolders for OnceCell<N> {
    fn shape(&self) -> NestedShape {
        self.get().map_or(NestedShape::Single, N::shape)
    }

    fn holders(&self) -> Vec<&dyn Holder> {
        self.get().map_or_else(Vec::new, N::holders)
    }

    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder> {
        self.get_mut()?.holder_mut(index)
    }
}

impl<H: Holder> NestedHolders for Vec<H> {
    fn shape(&self) -> NestedShape {
        NestedShape::Sequence
    }

    fn holders(&self) -> Vec<&dyn Holder> {
        self.iter().map(|h| h as &dyn Holder).collect()
    }

    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder> {
        self.get_mut(index).map(|h| h as &mut dyn Holder)
    }
}

impl<H: Holder, const N: usize> NestedHolders for [H; N] {
    fn shape(&self) -> NestedShape {
        NestedShape::Array
    }

    fn holders(&self) -> Vec<&dyn Holder> {
        self.iter().map(|h| h as &dyn Holder).collect()
    }

    fn holder_mut(&mut self, index: usize) -> Option<&mut dyn Holder> {
        self.get_mut(index).map(|h| h as &mut dyn Holder)
    }
}

// ─── holder! ────────────────────────────────────────────────────────────────

/// Declare which fields of a struct are cells and which lead to nested holders.
///
/// ```
/// use mutation_cell::{ModifiableBytes, ModifiableU32, holder};
///
/// struct Extension {
///     kind: ModifiableU32,
///     payload: ModifiableBytes,
/// }
///
/// struct Hello {
///     version: ModifiableU32,
///     extensions: Vec<Extension>,
/// }
///
/// holder!(Extension { cells: [kind, payload], nested: [] });
/// holder!(Hello { cells: [version], nested: [extensions] });
/// ```
///
/// Cell fields must implement `CellField` (`MutationCell<T>` or
/// `Option<MutationCell<T>>`); nested fields must implement `NestedHolders`.
/// The macro also makes the type itself usable as a single nested holder.
#[macro_export]
macro_rules! holder {
    ($ty:ty { cells: [$($cell:ident),* $(,)?], nested: [$($nested:ident),* $(,)?] $(,)? }) => {
        impl $crate::analyzer::Holder for $ty {
            #[allow(unused_mut)]
            fn cell_slots(
                &self,
            ) -> ::std::vec::Vec<(&'static str, &dyn $crate::analyzer::AnyCell)> {
                let mut slots = ::std::vec::Vec::new();
                $(
                    if let ::std::option::Option::Some(cell) =
                        $crate::analyzer::CellField::as_cell(&self.$cell)
                    {
                        slots.push((stringify!($cell), cell));
                    }
                )*
                slots
            }

            fn nested_slots(
                &self,
            ) -> ::std::vec::Vec<(&'static str, &dyn $crate::analyzer::NestedHolders)> {
                ::std::vec![
                    $((stringify!($nested), &self.$nested as &dyn $crate::analyzer::NestedHolders)),*
                ]
            }

            #[allow(unused_variables)]
            fn cell_slot_mut(
                &mut self,
                field: &str,
            ) -> ::std::option::Option<&mut dyn $crate::analyzer::AnyCell> {
                $(
                    if field == stringify!($cell) {
                        return $crate::analyzer::CellField::as_cell_mut(&mut self.$cell);
                    }
                )*
                ::std::option::Option::None
            }

            #[allow(unused_variables)]
            fn nested_slot_mut(
                &mut self,
                field: &str,
            ) -> ::std::option::Option<&mut dyn $crate::analyzer::NestedHolders> {
                $(
                    if field == stringify!($nested) {
                        return ::std::option::Option::Some(
                            &mut self.$nested as &mut dyn $crate::analyzer::NestedHolders,
                        );
                    }
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::analyzer::NestedHolders for $ty {
            fn shape(&self) -> $crate::analyzer::NestedShape {
                $crate::analyzer::NestedShape::Single
            }

            fn holders(&self) -> ::std::vec::Vec<&dyn $crate::analyzer::Holder> {
                ::std::vec![self as &dyn $crate::analyzer::Holder]
            }

            fn holder_mut(
                &mut self,
                index: usize,
            ) -> ::std::option::Option<&mut dyn $crate::analyzer::Holder> {
                if index == 0 {
                    ::std::option::Option::Some(self as &mut dyn $crate::analyzer::Holder)
                } else {
                    ::std::option::Option::None
                }
            }
        }
    };
}
