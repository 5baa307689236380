//! Statement text as pages of tokens.
//!
//! A token is one run of text on a line; columns in extracted PDF text are
//! separated by two or more spaces, so that is where lines are split.
//!
//!   ACCOUNT TOTAL        Principal        Interest
//!   -> ["ACCOUNT TOTAL", "Principal", "Interest"]

use anyhow::Result;
use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPages {
    pages: Vec<Vec<String>>,
}

impl StatementPages {
    /// Tokenize one extracted text blob per page.
    pub fn from_page_texts<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let gap_re = Regex::new(r"\s{2,}|\t")?;

        let pages = texts
            .into_iter()
            .map(|text| {
                text.as_ref()
                    .lines()
                    .flat_map(|line| gap_re.split(line))
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect();

        Ok(Self { pages })
    }

    pub fn from_tokens(pages: Vec<Vec<String>>) -> Self {
        Self { pages }
    }

    pub fn page(&self, index: usize) -> Option<&[String]> {
        self.pages.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_lines_and_column_gaps() {
        let pages = StatementPages::from_page_texts([
            "ACCOUNT TOTAL      $5,642.24\n\n  Notes   12\n",
            "Deposits\t$500.00",
        ])
        .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(
            pages.page(0).unwrap(),
            ["ACCOUNT TOTAL", "$5,642.24", "Notes", "12"]
        );
        assert_eq!(pages.page(1).unwrap(), ["Deposits", "$500.00"]);
        assert!(pages.page(2).is_none());
    }
}
