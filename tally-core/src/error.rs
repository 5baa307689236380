//! Error type for reference parsing and translation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellRefError {
    #[error("empty column letters")]
    EmptyColumn,

    #[error("invalid column letters '{0}'")]
    InvalidColumn(String),

    #[error("column letters '{0}' are too large")]
    ColumnOverflow(String),

    #[error("column number must be at least 1")]
    ZeroColumn,

    #[error("invalid A1 reference '{0}'")]
    InvalidA1(String),

    #[error("invalid R1C1 reference '{0}'")]
    InvalidR1C1(String),

    #[error("'{reference}' resolves outside the sheet when anchored at {anchor}")]
    OutOfRange { reference: String, anchor: String },
}

pub type Result<T> = std::result::Result<T, CellRefError>;
