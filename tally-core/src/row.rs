//! Spreadsheet rows as sparse column maps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell_ref::letter_to_number;
use crate::error::Result;

/// A raw cell value as the sheet hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// One spreadsheet row keyed by 1-based column number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<u32, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, col: u32, value: impl Into<CellValue>) -> Option<CellValue> {
        self.0.insert(col, value.into())
    }

    /// Insert by column letters (`"c"` is column 3).
    pub fn insert_lettered(&mut self, letters: &str, value: impl Into<CellValue>) -> Result<()> {
        let col = letter_to_number(letters)?;
        self.0.insert(col, value.into());
        Ok(())
    }

    pub fn get(&self, col: u32) -> Option<&CellValue> {
        self.0.get(&col)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &CellValue)> + '_ {
        self.0.iter().map(|(&col, value)| (col, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest populated column, if any.
    pub fn last_column(&self) -> Option<u32> {
        self.0.keys().next_back().copied()
    }

    /// Dense values for columns `1..=last_column`; gaps are `None`.
    pub fn to_dense(&self) -> Vec<Option<&CellValue>> {
        let width = self.last_column().unwrap_or(0);
        (1..=width).map(|col| self.0.get(&col)).collect()
    }
}

impl<V: Into<CellValue>> FromIterator<(u32, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (u32, V)>>(iter: I) -> Self {
        Row(iter.into_iter().map(|(col, v)| (col, v.into())).collect())
    }
}

impl IntoIterator for Row {
    type Item = (u32, CellValue);
    type IntoIter = std::collections::btree_map::IntoIter<u32, CellValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_json_mixes_strings_and_numbers() {
        let row: Row = serde_json::from_str(r#"{"1": "1/1/2015", "3": 500, "6": "=B30"}"#).unwrap();
        assert_eq!(row.get(1), Some(&CellValue::from("1/1/2015")));
        assert_eq!(row.get(3), Some(&CellValue::Number(500.0)));
        assert_eq!(row.last_column(), Some(6));
        assert!(row.get(2).is_none());
    }

    #[test]
    fn test_insert_lettered() {
        let mut row = Row::new();
        row.insert_lettered("C", "500").unwrap();
        row.insert_lettered("aa", 1.0).unwrap();
        assert_eq!(row.get(3), Some(&CellValue::from("500")));
        assert_eq!(row.get(27), Some(&CellValue::Number(1.0)));
        assert!(row.insert_lettered("3", "x").is_err());
    }

    #[test]
    fn test_to_dense_fills_gaps() {
        let row: Row = [(1, "a"), (3, "c")].into_iter().collect();
        let dense = row.to_dense();
        assert_eq!(dense.len(), 3);
        assert!(dense[1].is_none());
        assert_eq!(dense[2], Some(&CellValue::from("c")));
    }
}
