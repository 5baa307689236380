//! Lender-specific statement parsers.

pub mod lending_club;
