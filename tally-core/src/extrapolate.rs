//! Row extrapolation: guess row N+1 from rows N-1 and N.
//!
//! Every column present in both rows is classified by looking at the pair of
//! values, and the first matching class decides the rule:
//!
//! 1. identical values are copied,
//! 2. dates advance by the month step (or day step within a month),
//! 3. numbers continue linearly,
//! 4. formulas with A1 references move relative rows down by one,
//! 5. anything else copies the later value.
//!
//! ```
//! use tally_core::{extrapolate, CellValue, Row};
//!
//! let prev: Row = [(1, "24"), (2, "=B30")].into_iter().collect();
//! let last: Row = [(1, "30"), (2, "=B31")].into_iter().collect();
//! let next = extrapolate(&prev, &last, None).unwrap();
//! assert_eq!(next.get(1), Some(&CellValue::from("36")));
//! assert_eq!(next.get(2), Some(&CellValue::from("=B32")));
//! ```

use std::borrow::Cow;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::cell_ref::translate_row;
use crate::error::Result;
use crate::row::{CellValue, Row};
use crate::scan::{scan_a1, substitute, A1Ref, Token};

/// How a pair of values is extrapolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Identical,
    Date,
    Numeric,
    RelativeFormula,
    Opaque,
}

/// Classification with the parsed payload the rule needs.
enum Trend {
    Identical,
    Date(NaiveDate, NaiveDate),
    Numeric(Decimal, Decimal),
    RelativeFormula(Vec<Token<A1Ref>>),
    Opaque,
}

#[derive(Debug, Clone, Copy)]
struct Decimal {
    value: f64,
    scale: usize,
}

/// Extrapolate the row after `row2`.
///
/// When `row_numbers` is given, both rows are read as R1C1 and normalized to
/// A1 first, anchored at their own row numbers. Columns missing from either
/// row are left out of the result.
pub fn extrapolate(row1: &Row, row2: &Row, row_numbers: Option<(u32, u32)>) -> Result<Row> {
    let (row1, row2): (Cow<'_, Row>, Cow<'_, Row>) = match row_numbers {
        Some((n1, n2)) => (
            Cow::Owned(translate_row(row1, n1)?),
            Cow::Owned(translate_row(row2, n2)?),
        ),
        None => (Cow::Borrowed(row1), Cow::Borrowed(row2)),
    };

    let mut out = Row::new();
    for (col, v1) in row1.iter() {
        if let Some(v2) = row2.get(col) {
            out.insert(col, extrapolate_value(v1, v2));
        }
    }
    Ok(out)
}

/// Next value for one column given its two previous values.
pub fn extrapolate_value(v1: &CellValue, v2: &CellValue) -> CellValue {
    let v1 = strip_grouping(v1);
    let v2 = strip_grouping(v2);

    match trend(&v1, &v2) {
        Trend::Identical | Trend::Opaque => v2,
        Trend::Date(d1, d2) => match next_date(d1, d2) {
            Some(d) => CellValue::Text(format!("{}/{}/{}", d.month(), d.day(), d.year())),
            None => v2,
        },
        Trend::Numeric(n1, n2) => {
            let scale = n1.scale.max(n2.scale);
            // `+ 0.0` folds a negative zero so it never prints as "-0"
            let next = n2.value + (n2.value - n1.value) + 0.0;
            CellValue::Text(format!("{next:.scale$}"))
        }
        Trend::RelativeFormula(tokens) => {
            let shifted = v2
                .as_text()
                .and_then(|text| substitute(text, &tokens, |token| Ok(shift_row(&token.reference))).ok());
            shifted.map_or(v2, CellValue::Text)
        }
    }
}

/// Class of a value pair, after thousands separators are stripped.
pub fn classify(v1: &CellValue, v2: &CellValue) -> ValueClass {
    match trend(&strip_grouping(v1), &strip_grouping(v2)) {
        Trend::Identical => ValueClass::Identical,
        Trend::Date(..) => ValueClass::Date,
        Trend::Numeric(..) => ValueClass::Numeric,
        Trend::RelativeFormula(_) => ValueClass::RelativeFormula,
        Trend::Opaque => ValueClass::Opaque,
    }
}

fn trend(v1: &CellValue, v2: &CellValue) -> Trend {
    if v1 == v2 {
        return Trend::Identical;
    }
    if let (Some(d1), Some(d2)) = (parse_date(v1), parse_date(v2)) {
        return Trend::Date(d1, d2);
    }
    if let (Some(n1), Some(n2)) = (parse_decimal(v1), parse_decimal(v2)) {
        return Trend::Numeric(n1, n2);
    }
    if let (CellValue::Text(t1), CellValue::Text(t2)) = (v1, v2) {
        let tokens = scan_a1(t2);
        if !tokens.is_empty() && !scan_a1(t1).is_empty() {
            return Trend::RelativeFormula(tokens);
        }
    }
    Trend::Opaque
}

/// Drop `,` from text that starts with a digit (`5,200` -> `5200`).
fn strip_grouping(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(s) if s.starts_with(|c: char| c.is_ascii_digit()) => {
            CellValue::Text(s.replace(',', ""))
        }
        _ => value.clone(),
    }
}

fn shift_row(reference: &A1Ref) -> String {
    if reference.row_absolute {
        return reference.to_string();
    }
    match reference.row.checked_add(1) {
        Some(row) => reference.with_row(row).to_string(),
        None => reference.to_string(),
    }
}

fn next_date(d1: NaiveDate, d2: NaiveDate) -> Option<NaiveDate> {
    let months = (d2.year() - d1.year()) * 12 + d2.month() as i32 - d1.month() as i32;
    if months == 0 {
        let days = i64::from(d2.day()) - i64::from(d1.day());
        return if days >= 0 {
            d2.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            d2.checked_sub_days(Days::new(days.unsigned_abs()))
        };
    }

    // Step from the 1st and add the day back, so a day past the target
    // month's end rolls into the following month (1/31 + 1 month = 3/3).
    let first = d2.with_day(1)?;
    let stepped = if months > 0 {
        first.checked_add_months(Months::new(months.unsigned_abs()))?
    } else {
        first.checked_sub_months(Months::new(months.unsigned_abs()))?
    };
    stepped.checked_add_days(Days::new(u64::from(d2.day() - 1)))
}

/// Dates the sheet is likely to hold: `m/d/yyyy`, `m/d/yy`, `yyyy-mm-dd`,
/// `March 1, 2015`, `Mar 1 2015`.
fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    let s = value.as_text()?.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(d) = parse_slash_date(s) {
        return Some(d);
    }
    ["%Y-%m-%d", "%B %d, %Y", "%B %d %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let (m, d, y) = (parts.next()?, parts.next()?, parts.next()?);
    let numeric = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if parts.next().is_some() || !(numeric(m) && numeric(d) && numeric(y)) {
        return None;
    }

    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let mut year: i32 = y.parse().ok()?;
    if y.len() <= 2 {
        year += if year < 50 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Plain decimal text (`-12`, `5400.50`, `.5`) or a numeric cell.
fn parse_decimal(value: &CellValue) -> Option<Decimal> {
    match value {
        CellValue::Number(n) if n.is_finite() => {
            let text = n.to_string();
            let scale = text.split_once('.').map_or(0, |(_, frac)| frac.len());
            Some(Decimal { value: *n, scale })
        }
        CellValue::Number(_) => None,
        CellValue::Text(s) => {
            let s = s.trim();
            let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
            let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
            let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
            if (int.is_empty() && frac.is_empty()) || !all_digits(int) || !all_digits(frac) {
                return None;
            }
            Some(Decimal {
                value: s.parse().ok()?,
                scale: frac.len(),
            })
        }
    }
}
