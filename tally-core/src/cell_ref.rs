//! Column letters and cell references.
//!
//! Columns are a bijective base-26 numeral over `a..z`: `a` = 1, `z` = 26,
//! `aa` = 27. There is no zero digit, so every position holds 1..=26 and
//! converting back needs a borrow instead of a plain remainder.
//!
//! # Examples
//!
//! ```
//! use tally_core::{letter_to_number, number_to_letter, translate_reference};
//!
//! assert_eq!(letter_to_number("az").unwrap(), 52);
//! assert_eq!(number_to_letter(53).unwrap(), "ba");
//! assert_eq!(translate_reference("R2C[-1]", "D30").unwrap(), "C$2");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{CellRefError, Result};
use crate::row::{CellValue, Row};
use crate::scan::{a1_at, scan_r1c1, substitute, R1C1Ref, RefSpec};

/// Interpret `letters` as a column numeral, case-insensitive.
pub fn letter_to_number(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(CellRefError::EmptyColumn);
    }

    letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return Err(CellRefError::InvalidColumn(letters.to_string()));
        }
        let digit = u32::from(c.to_ascii_lowercase() as u8 - b'a') + 1;
        acc.checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| CellRefError::ColumnOverflow(letters.to_string()))
    })
}

/// Lowercase column letters for a 1-based column number.
pub fn number_to_letter(n: u32) -> Result<String> {
    if n == 0 {
        return Err(CellRefError::ZeroColumn);
    }

    let mut digits = Vec::new();
    let mut rest = n;
    while rest > 0 {
        // Shift to 0..=25 first; a zero remainder becomes `z` and borrows one
        // from the next position.
        rest -= 1;
        digits.push(char::from(b'a' + (rest % 26) as u8));
        rest /= 26;
    }
    Ok(digits.into_iter().rev().collect())
}

/// A resolved cell position, 1-based, with per-axis absolute markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
    pub col_absolute: bool,
    pub row_absolute: bool,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            col_absolute: false,
            row_absolute: false,
        }
    }

    /// Parse a single A1 reference such as `D30` or `$b$2`.
    pub fn parse_a1(s: &str) -> Result<Self> {
        let invalid = || CellRefError::InvalidA1(s.to_string());
        let (end, a1) = a1_at(s.as_bytes(), 0).ok_or_else(invalid)?;
        if end != s.len() {
            return Err(invalid());
        }

        let row = u32::try_from(a1.row).map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Self {
            col: letter_to_number(&a1.column)?,
            row,
            col_absolute: a1.col_absolute,
            row_absolute: a1.row_absolute,
        })
    }

    /// Resolve an R1C1 reference written in the cell at `self`.
    pub fn resolve(&self, reference: &R1C1Ref) -> Option<CellRef> {
        let (row, row_absolute) = resolve_axis(reference.row, self.row)?;
        let (col, col_absolute) = resolve_axis(reference.col, self.col)?;
        Some(CellRef {
            col,
            row,
            col_absolute,
            row_absolute,
        })
    }
}

impl FromStr for CellRef {
    type Err = CellRefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_a1(s)
    }
}

/// Uppercase A1 text, `$` in front of absolute components.
impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = number_to_letter(self.col).map_err(|_| fmt::Error)?;
        if self.col_absolute {
            f.write_str("$")?;
        }
        f.write_str(&letters.to_ascii_uppercase())?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row)
    }
}

fn resolve_axis(spec: RefSpec, anchor: u32) -> Option<(u32, bool)> {
    match spec {
        // `R0` is not a real row; it reads as "this row", like an empty spec.
        RefSpec::Same | RefSpec::Absolute(0) | RefSpec::Relative(0) => Some((anchor, false)),
        RefSpec::Absolute(index) => Some((index, true)),
        RefSpec::Relative(offset) => {
            let index = i64::from(anchor).checked_add(offset)?;
            u32::try_from(index).ok().filter(|&i| i >= 1).map(|i| (i, false))
        }
    }
}

/// Translate an R1C1 reference into A1 text, anchored at the A1 cell `anchor`.
pub fn translate_reference(reference: &str, anchor: &str) -> Result<String> {
    let parsed = R1C1Ref::parse(reference)?;
    let cell = CellRef::parse_a1(anchor)?;
    let resolved = cell.resolve(&parsed).ok_or_else(|| CellRefError::OutOfRange {
        reference: reference.to_string(),
        anchor: anchor.to_string(),
    })?;
    Ok(resolved.to_string())
}

/// Rewrite every R1C1 reference in `row` as A1, each anchored at its own cell
/// (column key, `row_number`). Values without references pass through.
pub fn translate_row(row: &Row, row_number: u32) -> Result<Row> {
    let mut out = Row::new();
    for (col, value) in row.iter() {
        let translated = match value {
            CellValue::Text(text) => {
                let tokens = scan_r1c1(text);
                if tokens.is_empty() {
                    value.clone()
                } else {
                    let anchor = CellRef::new(col, row_number);
                    CellValue::Text(substitute(text, &tokens, |token| {
                        anchor
                            .resolve(&token.reference)
                            .map(|cell| cell.to_string())
                            .ok_or_else(|| CellRefError::OutOfRange {
                                reference: token.text.clone(),
                                anchor: anchor.to_string(),
                            })
                    })?)
                }
            }
            CellValue::Number(_) => value.clone(),
        };
        out.insert(col, translated);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_to_number_known_values() {
        assert_eq!(letter_to_number("a").unwrap(), 1);
        assert_eq!(letter_to_number("z").unwrap(), 26);
        assert_eq!(letter_to_number("aa").unwrap(), 27);
        assert_eq!(letter_to_number("az").unwrap(), 52);
        assert_eq!(letter_to_number("ba").unwrap(), 53);
        assert_eq!(letter_to_number("ZZ").unwrap(), 702);
        assert_eq!(letter_to_number("aaa").unwrap(), 703);
        assert_eq!(letter_to_number("XFD").unwrap(), 16384);
    }

    #[test]
    fn test_letter_to_number_rejects_bad_input() {
        assert_eq!(letter_to_number(""), Err(CellRefError::EmptyColumn));
        assert!(matches!(letter_to_number("a1"), Err(CellRefError::InvalidColumn(_))));
        assert!(matches!(letter_to_number("é"), Err(CellRefError::InvalidColumn(_))));
        assert!(matches!(
            letter_to_number(&"z".repeat(20)),
            Err(CellRefError::ColumnOverflow(_))
        ));
    }

    #[test]
    fn test_number_to_letter_borrows() {
        assert_eq!(number_to_letter(1).unwrap(), "a");
        assert_eq!(number_to_letter(26).unwrap(), "z");
        assert_eq!(number_to_letter(27).unwrap(), "aa");
        assert_eq!(number_to_letter(52).unwrap(), "az");
        assert_eq!(number_to_letter(702).unwrap(), "zz");
        assert_eq!(number_to_letter(703).unwrap(), "aaa");
        // 26*26 + 26 + 26: two borrows in a row
        assert_eq!(number_to_letter(728).unwrap(), "aaz");
        assert_eq!(number_to_letter(0), Err(CellRefError::ZeroColumn));
    }

    #[test]
    fn test_round_trip_through_three_letters() {
        for n in 1..=18_278 {
            let letters = number_to_letter(n).unwrap();
            assert_eq!(letter_to_number(&letters).unwrap(), n, "{letters}");
        }
        assert_eq!(number_to_letter(18_278).unwrap(), "zzz");
    }

    #[test]
    fn test_translate_reference() {
        assert_eq!(translate_reference("R2C[-1]", "D30").unwrap(), "C$2");
        assert_eq!(translate_reference("R[-1]C1", "D30").unwrap(), "$A29");
        assert_eq!(translate_reference("RC", "d30").unwrap(), "D30");
        assert_eq!(translate_reference("r[1]c[1]", "Z9").unwrap(), "AA10");
        assert_eq!(translate_reference("R5C4", "A1").unwrap(), "$D$5");
        assert_eq!(translate_reference("R0C[0]", "B7").unwrap(), "B7");
    }

    #[test]
    fn test_translate_reference_errors() {
        assert!(matches!(
            translate_reference("R[-30]C", "D30"),
            Err(CellRefError::OutOfRange { .. })
        ));
        assert!(matches!(
            translate_reference("X2C1", "D30"),
            Err(CellRefError::InvalidR1C1(_))
        ));
        assert!(matches!(
            translate_reference("R2C1", "30D"),
            Err(CellRefError::InvalidA1(_))
        ));
    }

    #[test]
    fn test_translate_row_anchors_each_column() {
        let mut row = Row::new();
        row.insert(2, "=R[-1]C+R[-1]C[-1]");
        row.insert(4, "=SUM(R2C:R[-1]C)");
        row.insert(5, "Source");
        row.insert(6, 12.5);

        let out = translate_row(&row, 31).unwrap();
        assert_eq!(out.get(2), Some(&CellValue::from("=B30+A30")));
        assert_eq!(out.get(4), Some(&CellValue::from("=SUM(D$2:D30)")));
        assert_eq!(out.get(5), Some(&CellValue::from("Source")));
        assert_eq!(out.get(6), Some(&CellValue::Number(12.5)));
    }

    #[test]
    fn test_cell_ref_display_and_parse() {
        let cell: CellRef = "$ab$12".parse().unwrap();
        assert_eq!(cell.col, 28);
        assert_eq!(cell.row, 12);
        assert_eq!(cell.to_string(), "$AB$12");
        assert!("A0".parse::<CellRef>().is_err());
    }
}
