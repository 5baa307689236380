//! Statement-to-sheet sync: scrape the statement, extrapolate the next sheet
//! row from the two most recent ones, overlay the scraped figures, write it.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tally_core::{extrapolate, Row};
use tally_ingest::{LendingClubLayout, StatementSummary};

use crate::lending_club::{LendingClubClient, StatementPeriod};
use crate::sheets::SheetStore;

/// How formulas in the sheet are spelled when read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaNotation {
    #[default]
    A1,
    R1C1,
}

/// Which sheet columns receive the scraped figures (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub deposits_column: u32,
    pub balance_column: u32,
    pub notation: FormulaNotation,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            deposits_column: 3,
            balance_column: 6,
            notation: FormulaNotation::A1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub summary: StatementSummary,
    pub row_number: u32,
    pub row: Row,
    pub written: bool,
}

/// Extrapolate the row after the last non-empty row of `rows` (index 0 is
/// sheet row 1). Returns the new row's number and its cells.
pub fn extrapolate_next(rows: &[Row], notation: FormulaNotation) -> Result<(u32, Row)> {
    let last = rows
        .iter()
        .rposition(|r| !r.is_empty())
        .context("sheet is empty")?;
    if last == 0 {
        bail!("need two filled rows to extrapolate from, sheet has one");
    }

    let n1 = u32::try_from(last).context("sheet has too many rows")?;
    let n2 = n1.checked_add(1).context("sheet has too many rows")?;
    let row_numbers = match notation {
        FormulaNotation::R1C1 => Some((n1, n2)),
        FormulaNotation::A1 => None,
    };

    let row = extrapolate(&rows[last - 1], &rows[last], row_numbers)
        .with_context(|| format!("extrapolating rows {n1} and {n2}"))?;
    let next = n2.checked_add(1).context("sheet has too many rows")?;
    Ok((next, row))
}

/// [`extrapolate_next`] with the statement figures written over their columns.
pub fn next_row(rows: &[Row], summary: &StatementSummary, layout: &SheetLayout) -> Result<(u32, Row)> {
    let (row_number, mut row) = extrapolate_next(rows, layout.notation)?;
    row.insert(layout.deposits_column, summary.deposits.clone());
    row.insert(layout.balance_column, summary.balance.clone());
    Ok((row_number, row))
}

/// Read the sheet, compute the next row, and write it unless `dry_run`.
pub async fn update_sheet<S: SheetStore>(
    store: &mut S,
    summary: &StatementSummary,
    layout: &SheetLayout,
    dry_run: bool,
) -> Result<SyncReport> {
    tracing::info!(deposits = %summary.deposits, balance = %summary.balance, "updating sheet");

    let rows = store.read_rows().await.context("reading sheet")?;
    let (row_number, row) = next_row(&rows, summary, layout)?;
    tracing::info!(row = row_number, cells = ?row, "new row");

    if dry_run {
        tracing::info!("dry run; sheet left unchanged");
    } else {
        store
            .write_row(row_number, &row)
            .await
            .with_context(|| format!("writing row {row_number}"))?;
    }

    Ok(SyncReport {
        summary: summary.clone(),
        row_number,
        row,
        written: !dry_run,
    })
}

/// The whole monthly run: statement for `period`, then the sheet update.
pub async fn run_sync<S: SheetStore>(
    client: &LendingClubClient,
    store: &mut S,
    period: StatementPeriod,
    statement_layout: &LendingClubLayout,
    sheet_layout: &SheetLayout,
    dry_run: bool,
) -> Result<SyncReport> {
    let summary = client.fetch_summary(period, statement_layout).await?;
    let report = update_sheet(store, &summary, sheet_layout, dry_run).await?;
    tracing::info!(%period, row = report.row_number, "sync finished");
    Ok(report)
}
