//! Discovery of mutation cells inside an object graph.
//!
//! Types opt in with the [`holder!`](crate::holder) macro, which lists their
//! cell fields and the fields that lead to further holders. The walk visits
//! each holder once per call, so shared and cyclic `Rc` graphs terminate.

pub mod holder;
mod walk;

pub use holder::{AnyCell, CellField, Holder, NestedHolders, NestedShape};
pub use walk::{
    CellPath, HolderRecord, PathStep, choose_cell, find_cells, find_cells_of, find_holders,
    resolve_cell_mut, resolve_mut,
};
