//! Spreadsheet transports.
//!
//! A store hands out every row of one worksheet (index 0 is sheet row 1) and
//! writes a single row back by its 1-based row number.

use std::future::Future;

use anyhow::Result;
use tally_core::Row;

pub mod csv_sheet;
pub mod google;

pub use csv_sheet::CsvSheet;
pub use google::{GoogleCredentials, GoogleSheet, SpreadsheetTarget};

pub trait SheetStore {
    fn read_rows(&mut self) -> impl Future<Output = Result<Vec<Row>>> + Send;

    fn write_row(&mut self, row_number: u32, row: &Row) -> impl Future<Output = Result<()>> + Send;
}
