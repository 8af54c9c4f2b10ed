pub mod analyzer;
pub mod catalog;
pub mod cell;
pub mod error;
pub mod hex_codec;
pub mod modification;
pub mod random;
pub mod types;

pub use analyzer::{
    AnyCell, CellPath, Holder, HolderRecord, choose_cell, find_cells, find_cells_of,
    find_holders, resolve_cell_mut, resolve_mut,
};
pub use cell::{
    Modifiable, ModifiableBool, ModifiableByte, ModifiableBytes, ModifiableI32, ModifiableI64,
    ModifiablePath, ModifiableString, ModifiableU32, ModifiableU64, Modification, MutationCell,
};
pub use error::MutationError;
pub use modification::{
    BoolModification, ByteModification, BytesModification, DelimitedPath, IntegerModification,
    PathModification, StringModification,
};
pub use random::RandomSource;
pub use types::RandomLimits;
