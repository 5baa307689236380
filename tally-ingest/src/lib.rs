//! tally-ingest: statement page text and label-offset extraction of summary fields.

pub mod pages;
pub mod parsers;
pub mod pdf;
pub mod types;

pub use pages::StatementPages;
pub use parsers::lending_club::{parse_statement, LabelRule, LendingClubLayout};
pub use types::StatementSummary;
