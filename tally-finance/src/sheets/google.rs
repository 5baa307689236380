//! Google Sheets (API v4) worksheet store.
//!
//! Auth is the installed-app refresh-token grant: a long-lived refresh token
//! is exchanged for an access token once per run. Formulas are read as
//! written (`valueRenderOption=FORMULA`) so relative references survive, and
//! rows are written with `USER_ENTERED` so the sheet parses numbers, dates and
//! formulas the way typing them would.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tally_core::{CellValue, Row};

use super::SheetStore;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_URL: &str = "https://sheets.googleapis.com";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// How the spreadsheet is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetTarget {
    Id(String),
    /// Looked up through Drive; the name must match exactly one spreadsheet.
    Name(String),
}

pub struct GoogleSheet {
    http: reqwest::Client,
    access_token: String,
    spreadsheet_id: String,
    worksheet: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DriveFiles {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheet {
    pub async fn connect(
        credentials: &GoogleCredentials,
        target: &SpreadsheetTarget,
        worksheet: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::new();
        let access_token = refresh_access_token(&http, credentials).await?;

        let spreadsheet_id = match target {
            SpreadsheetTarget::Id(id) => id.clone(),
            SpreadsheetTarget::Name(name) => find_spreadsheet(&http, &access_token, name).await?,
        };

        let worksheet = worksheet.into();
        tracing::info!(%spreadsheet_id, %worksheet, "connected to Google Sheets");
        Ok(Self {
            http,
            access_token,
            spreadsheet_id,
            worksheet,
        })
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(SHEETS_URL)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("cannot build Sheets URL"))?
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }
}

impl SheetStore for GoogleSheet {
    async fn read_rows(&mut self) -> Result<Vec<Row>> {
        let range = quote_sheet(&self.worksheet);
        let url = self.values_url(&range)?;

        let body: ValueRange = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueRenderOption", "FORMULA"), ("majorDimension", "ROWS")])
            .send()
            .await
            .context("Sheets values.get")?
            .error_for_status()
            .context("Sheets values.get")?
            .json()
            .await
            .context("decode Sheets values")?;

        let rows = values_to_rows(body.values);
        tracing::info!(rows = rows.len(), worksheet = %self.worksheet, "received spreadsheet");
        Ok(rows)
    }

    async fn write_row(&mut self, row_number: u32, row: &Row) -> Result<()> {
        let range = format!("{}!A{row_number}", quote_sheet(&self.worksheet));
        let url = self.values_url(&range)?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [row_to_values(row)],
        });

        self.http
            .put(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&body)
            .send()
            .await
            .context("Sheets values.update")?
            .error_for_status()
            .context("Sheets values.update")?;

        tracing::info!(row = row_number, worksheet = %self.worksheet, "spreadsheet updated");
        Ok(())
    }
}

async fn refresh_access_token(http: &reqwest::Client, credentials: &GoogleCredentials) -> Result<String> {
    if credentials.client_id.is_empty() || credentials.refresh_token.is_empty() {
        bail!("Google OAuth client/refresh token missing (set CLIENT_ID / CLIENT_SECRET / REFRESH_TOKEN or [google] in config)");
    }

    let form = [
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("refresh_token", credentials.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];
    let token: TokenResponse = http
        .post(TOKEN_URL)
        .form(&form)
        .send()
        .await
        .context("Google token refresh")?
        .error_for_status()
        .context("Google token refresh")?
        .json()
        .await
        .context("decode Google token response")?;

    Ok(token.access_token)
}

async fn find_spreadsheet(http: &reqwest::Client, access_token: &str, name: &str) -> Result<String> {
    let query = format!(
        "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'")
    );

    let found: DriveFiles = http
        .get(DRIVE_FILES_URL)
        .bearer_auth(access_token)
        .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
        .send()
        .await
        .context("Drive files.list")?
        .error_for_status()
        .context("Drive files.list")?
        .json()
        .await
        .context("decode Drive files")?;

    match found.files.as_slice() {
        [file] => Ok(file.id.clone()),
        [] => bail!("no spreadsheet named '{name}'"),
        many => bail!("{} spreadsheets named '{name}'; set google.spreadsheet_id instead", many.len()),
    }
}

/// `Budget 2015` -> `'Budget 2015'` (quotes doubled inside).
fn quote_sheet(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Sheets value grid to rows. Empty cells are dropped so a row only holds
/// what the sheet shows.
fn values_to_rows(values: Vec<Vec<Value>>) -> Vec<Row> {
    values
        .into_iter()
        .map(|cells| {
            cells
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    let value = match v {
                        Value::String(s) if s.is_empty() => return None,
                        Value::String(s) => CellValue::Text(s),
                        Value::Number(n) => CellValue::Number(n.as_f64()?),
                        Value::Bool(b) => CellValue::Text(if b { "TRUE" } else { "FALSE" }.to_string()),
                        Value::Null | Value::Array(_) | Value::Object(_) => return None,
                    };
                    Some((i as u32 + 1, value))
                })
                .collect::<Row>()
        })
        .collect()
}

/// Row to a dense value list; gaps become `null`, which the API leaves untouched.
fn row_to_values(row: &Row) -> Vec<Value> {
    row.to_dense()
        .into_iter()
        .map(|cell| match cell {
            Some(CellValue::Text(s)) => Value::String(s.clone()),
            Some(CellValue::Number(n)) => json!(n),
            None => Value::Null,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_to_rows() {
        let values: Vec<Vec<Value>> = serde_json::from_value(json!([
            ["Date", "Deposits", "Total"],
            ["1/1/2015", "", 500, true],
            [],
        ]))
        .unwrap();

        let rows = values_to_rows(values);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].get(1), Some(&CellValue::from("1/1/2015")));
        assert!(rows[1].get(2).is_none());
        assert_eq!(rows[1].get(3), Some(&CellValue::Number(500.0)));
        assert_eq!(rows[1].get(4), Some(&CellValue::from("TRUE")));
        assert!(rows[2].is_empty());
    }

    #[test]
    fn test_row_to_values_fills_gaps_with_null() {
        let row: Row = [(1, CellValue::from("3/1/2015")), (3, CellValue::Number(500.0))]
            .into_iter()
            .collect();
        assert_eq!(row_to_values(&row), vec![json!("3/1/2015"), Value::Null, json!(500.0)]);
    }

    #[test]
    fn test_quote_sheet() {
        assert_eq!(quote_sheet("Sheet1"), "'Sheet1'");
        assert_eq!(quote_sheet("Bob's"), "'Bob''s'");
    }
}
