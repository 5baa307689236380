//! LendingClub web session: login, then download a monthly statement PDF.
//!
//! The site has no statement API. The flow mirrors what a browser does:
//! 1. POST the login form (session lives in the cookie jar)
//! 2. GET the monthly statement endpoint, which answers JSON with a `queryString`
//! 3. GET the download endpoint with that query string for the PDF bytes

use std::fmt;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tally_ingest::{parse_statement, pdf, LendingClubLayout, StatementSummary};

pub const DEFAULT_BASE_URL: &str = "https://www.lendingclub.com";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2227.1 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LendingClubCredentials {
    pub email: String,
    pub password: String,
}

/// A statement month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub year: i32,
    pub month: u32,
}

impl StatementPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("month must be 1-12, got {month}");
        }
        Ok(Self { year, month })
    }

    /// Statements are published after the month closes, so the latest one is
    /// for the month before `today`.
    pub fn previous_month(today: NaiveDate) -> Self {
        if today.month() == 1 {
            Self {
                year: today.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: today.year(),
                month: today.month() - 1,
            }
        }
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

pub struct LendingClubClient {
    http: reqwest::Client,
    base_url: String,
    credentials: LendingClubCredentials,
}

impl LendingClubClient {
    pub fn new(credentials: LendingClubCredentials) -> Result<Self> {
        if credentials.email.is_empty() || credentials.password.is_empty() {
            bail!("LendingClub email/password missing (set LENDING_CLUB_EMAIL / LENDING_CLUB_PASSWORD or [lending_club] in config)");
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/account/login.action", self.base_url);
        let form = [
            ("login_url", ""),
            ("login_email", self.credentials.email.as_str()),
            ("login_password", self.credentials.password.as_str()),
        ];

        let resp = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .context("LendingClub login request")?
            .error_for_status()
            .context("LendingClub login")?;

        let body = resp.text().await.context("read LendingClub login response")?;
        tracing::info!(rsp = %single_line(&body), "LendingClub login response");
        Ok(())
    }

    /// Download the statement PDF for `period`. Requires a prior [`login`](Self::login).
    pub async fn fetch_statement_pdf(&self, period: StatementPeriod) -> Result<Vec<u8>> {
        tracing::info!(%period, "fetching LendingClub statement");

        let body = self
            .http
            .get(statement_request_url(&self.base_url, period))
            .send()
            .await
            .context("statement request")?
            .error_for_status()
            .context("statement request")?
            .text()
            .await
            .context("read statement response")?;
        tracing::info!(rsp = %single_line(&body), "LendingClub pre-pdf response");

        let url = download_url(&self.base_url, &body)?;
        tracing::info!(%url, "LendingClub pdf url");

        let bytes = self
            .http
            .get(&url)
            .send()
            .await
            .context("statement download")?
            .error_for_status()
            .context("statement download")?
            .bytes()
            .await
            .context("read statement PDF")?;
        tracing::info!(bytes = bytes.len(), "received pdf");

        Ok(bytes.to_vec())
    }

    /// Login, download, and parse the statement for `period`.
    pub async fn fetch_summary(&self, period: StatementPeriod, layout: &LendingClubLayout) -> Result<StatementSummary> {
        self.login().await?;
        let bytes = self.fetch_statement_pdf(period).await?;
        let pages = pdf::extract_pages(&bytes)?;
        parse_statement(&pages, layout).with_context(|| format!("statement {period}"))
    }
}

pub fn statement_request_url(base_url: &str, period: StatementPeriod) -> String {
    let (y, m) = (period.year, period.month);
    format!(
        "{base_url}/account/monthlyStatementDownload.action?file_extension=pdf\
&start_date_monthly_statements={y}-{m:02}-01&attachmentName=Monthly_Statement_{y}_{m:02}.pdf"
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementLink {
    query_string: String,
}

fn download_url(base_url: &str, body: &str) -> Result<String> {
    let link: StatementLink = serde_json::from_str(body)
        .with_context(|| format!("unexpected statement response: {}", single_line(body)))?;
    Ok(format!(
        "{base_url}/account/downloadMonthlyStatement.action?{}",
        link.query_string
    ))
}

fn single_line(s: &str) -> String {
    s.trim().replace(['\r', '\n'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_month_wraps_year() {
        let jan = NaiveDate::from_ymd_opt(2016, 1, 10).unwrap();
        assert_eq!(StatementPeriod::previous_month(jan), StatementPeriod { year: 2015, month: 12 });

        let jul = NaiveDate::from_ymd_opt(2015, 7, 1).unwrap();
        assert_eq!(StatementPeriod::previous_month(jul), StatementPeriod { year: 2015, month: 6 });
    }

    #[test]
    fn test_period_validation_and_display() {
        assert!(StatementPeriod::new(2015, 13).is_err());
        assert_eq!(StatementPeriod::new(2015, 6).unwrap().to_string(), "2015-06");
    }

    #[test]
    fn test_statement_request_url() {
        let url = statement_request_url(DEFAULT_BASE_URL, StatementPeriod { year: 2015, month: 6 });
        assert_eq!(
            url,
            "https://www.lendingclub.com/account/monthlyStatementDownload.action?file_extension=pdf\
&start_date_monthly_statements=2015-06-01&attachmentName=Monthly_Statement_2015_06.pdf"
        );
    }

    #[test]
    fn test_download_url_from_query_string() {
        let url = download_url(DEFAULT_BASE_URL, r#"{"queryString":"fileId=42&token=abc"}"#).unwrap();
        assert_eq!(
            url,
            "https://www.lendingclub.com/account/downloadMonthlyStatement.action?fileId=42&token=abc"
        );
        assert!(download_url(DEFAULT_BASE_URL, "<html>login</html>").is_err());
    }

    /// Serve one response whose body is shorter than its Content-Length.
    async fn truncated_body_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut req = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                req.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&req);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let body_len = text[..head_end]
                        .lines()
                        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if req.len() >= head_end + 4 + body_len || n == 0 {
                        break;
                    }
                } else if n == 0 {
                    break;
                }
            }
            sock.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_login_fails_when_response_body_is_cut_off() {
        let credentials = LendingClubCredentials {
            email: "me@example.com".to_string(),
            password: "secret".to_string(),
        };
        let client = LendingClubClient::new(credentials)
            .unwrap()
            .with_base_url(truncated_body_server().await);

        let err = client.login().await.unwrap_err();
        assert!(format!("{err:#}").contains("LendingClub login"));
    }

    #[test]
    fn test_client_requires_credentials() {
        assert!(LendingClubClient::new(LendingClubCredentials::default()).is_err());
    }
}
