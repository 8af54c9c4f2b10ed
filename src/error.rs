// ─── Error ──────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The operation replaces or rewrites a value and has none to work on.
    #[error("{operation} requires an original value, but none is set")]
    MissingOriginal { operation: &'static str },
    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),
    #[error("Invalid random limits: {0}")]
    Config(String),
}
