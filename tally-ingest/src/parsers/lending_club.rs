//! LendingClub monthly statement parser (label + fixed offset)
//!
//! The statement PDF has no stable table structure once converted to text, so
//! each figure is found by its label and a fixed distance in tokens:
//!
//!   page 1: ACCOUNT TOTAL  <4 column headings/values>  $5,642.24
//!   page 2: Deposits       <5 tokens>                  $500.00   (or `-`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pages::StatementPages;
use crate::types::StatementSummary;

/// Where one figure lives: the token `offset` places after `label` on `page`
/// (0-based page index).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub page: usize,
    pub label: String,
    pub offset: usize,
}

impl LabelRule {
    pub fn new(page: usize, label: impl Into<String>, offset: usize) -> Self {
        Self {
            page,
            label: label.into(),
            offset,
        }
    }

    /// The token at `label + offset`, using the first occurrence of the label.
    pub fn locate<'a>(&self, pages: &'a StatementPages) -> Result<&'a str> {
        let tokens = pages.page(self.page).with_context(|| {
            format!(
                "statement has {} page(s); '{}' is expected on page {}",
                pages.len(),
                self.label,
                self.page + 1
            )
        })?;

        let at = tokens
            .iter()
            .position(|t| t == &self.label)
            .with_context(|| format!("label '{}' not found on page {}", self.label, self.page + 1))?;

        tokens
            .get(at + self.offset)
            .map(String::as_str)
            .with_context(|| format!("nothing {} tokens after '{}'", self.offset, self.label))
    }
}

/// Label rules for the LendingClub statement layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingClubLayout {
    pub balance: LabelRule,
    pub deposits: LabelRule,
}

impl Default for LendingClubLayout {
    fn default() -> Self {
        Self {
            balance: LabelRule::new(0, "ACCOUNT TOTAL", 5),
            deposits: LabelRule::new(1, "Deposits", 6),
        }
    }
}

/// Pull balance and deposits out of a statement.
pub fn parse_statement(pages: &StatementPages, layout: &LendingClubLayout) -> Result<StatementSummary> {
    let balance = layout.balance.locate(pages).context("reading account total")?;
    let deposits = layout.deposits.locate(pages).context("reading deposits")?;

    let summary = StatementSummary {
        balance: clean_amount(balance),
        deposits: match clean_amount(deposits).as_str() {
            // Months without deposits print a dash.
            "-" => "0.00".to_string(),
            other => other.to_string(),
        },
    };

    tracing::info!(balance = %summary.balance, deposits = %summary.deposits, "parsed statement");
    Ok(summary)
}

fn clean_amount(raw: &str) -> String {
    raw.replace('$', "").trim().to_string()
}
