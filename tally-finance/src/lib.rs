//! tally-finance: LendingClub statement download, spreadsheet stores, and the sync pipeline

pub mod lending_club;
pub mod sheets;
pub mod sync;

pub use lending_club::{LendingClubClient, LendingClubCredentials, StatementPeriod};
pub use sheets::{CsvSheet, GoogleCredentials, GoogleSheet, SheetStore, SpreadsheetTarget};
pub use sync::{extrapolate_next, next_row, run_sync, update_sheet, FormulaNotation, SheetLayout, SyncReport};
