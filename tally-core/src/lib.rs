//! tally-core: cell reference conversion and row extrapolation for the tally sync

pub mod cell_ref;
pub mod error;
pub mod extrapolate;
pub mod row;
pub mod scan;

pub use cell_ref::{letter_to_number, number_to_letter, translate_reference, translate_row, CellRef};
pub use error::{CellRefError, Result};
pub use extrapolate::{classify, extrapolate, extrapolate_value, ValueClass};
pub use row::{CellValue, Row};
pub use scan::{scan_a1, scan_r1c1, substitute, A1Ref, R1C1Ref, RefSpec, Token};
