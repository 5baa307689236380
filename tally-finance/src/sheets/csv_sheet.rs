//! Local CSV file as a worksheet (no header row; line 1 is row 1).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tally_core::{CellValue, Row};

use super::SheetStore;

#[derive(Debug, Clone)]
pub struct CsvSheet {
    path: PathBuf,
}

impl CsvSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<Vec<String>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result.with_context(|| format!("reading {}", self.path.display()))?;
            records.push(record.iter().map(str::to_string).collect());
        }
        Ok(records)
    }

    fn write_records(&self, records: &[Vec<String>]) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("writing {}", self.path.display()))?;

        for record in records {
            // The csv writer rejects a record with no fields.
            if record.is_empty() {
                wtr.write_record([""])?;
            } else {
                wtr.write_record(record)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

impl SheetStore for CsvSheet {
    async fn read_rows(&mut self) -> Result<Vec<Row>> {
        let rows: Vec<Row> = self
            .read_records()?
            .into_iter()
            .map(|fields| {
                fields
                    .into_iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(i, v)| (i as u32 + 1, v))
                    .collect::<Row>()
            })
            .collect();
        Ok(rows)
    }

    /// Cells in `row` overwrite the target row; other cells of that row stay.
    async fn write_row(&mut self, row_number: u32, row: &Row) -> Result<()> {
        let mut records = self.read_records()?;
        let index = row_number.checked_sub(1).context("row numbers start at 1")? as usize;
        if records.len() <= index {
            records.resize(index + 1, Vec::new());
        }

        let record = &mut records[index];
        for (col, value) in row.iter() {
            let i = (col as usize).checked_sub(1).context("column numbers start at 1")?;
            if record.len() <= i {
                record.resize(i + 1, String::new());
            }
            record[i] = match value {
                CellValue::Text(s) => s.clone(),
                CellValue::Number(n) => n.to_string(),
            };
        }

        self.write_records(&records)?;
        tracing::info!(path = %self.path.display(), row = row_number, "wrote csv row");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "Date,Total\n1/1/2015,\"5,200\"\n2/1/2015,\"5,300\"\n").unwrap();

        let mut sheet = CsvSheet::new(&path);
        let rows = sheet.read_rows().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].get(2), Some(&CellValue::from("5,200")));

        let next: Row = [(1, "3/1/2015"), (3, "500")].into_iter().collect();
        sheet.write_row(4, &next).await.unwrap();

        let rows = sheet.read_rows().await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].get(1), Some(&CellValue::from("3/1/2015")));
        assert!(rows[3].get(2).is_none());
        assert_eq!(rows[3].get(3), Some(&CellValue::from("500")));
    }

    #[tokio::test]
    async fn test_overwrite_keeps_other_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "a,b,c\n").unwrap();

        let mut sheet = CsvSheet::new(&path);
        let patch: Row = [(2, "B")].into_iter().collect();
        sheet.write_row(1, &patch).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,B,c\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = CsvSheet::new(dir.path().join("nope.csv"));
        assert!(sheet.read_rows().await.unwrap().is_empty());
    }
}
