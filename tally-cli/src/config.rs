use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tally_finance::{GoogleCredentials, LendingClubCredentials, SheetLayout, SpreadsheetTarget};
use tally_ingest::LendingClubLayout;

use crate::state::ensure_tally_home;

/// Everything a run needs, built once in `main` and passed down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lending_club: LendingClubCredentials,
    pub google: GoogleSection,
    pub sheet: SheetLayout,
    pub statement: LendingClubLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSection {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Preferred over `spreadsheet_name` when both are set
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_name: Option<String>,
    pub worksheet: String,
}

impl Default for GoogleSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            spreadsheet_id: None,
            spreadsheet_name: None,
            worksheet: "Sheet1".to_string(),
        }
    }
}

impl GoogleSection {
    pub fn credentials(&self) -> GoogleCredentials {
        GoogleCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    pub fn target(&self) -> Result<SpreadsheetTarget> {
        match (&self.spreadsheet_id, &self.spreadsheet_name) {
            (Some(id), _) if !id.is_empty() => Ok(SpreadsheetTarget::Id(id.clone())),
            (_, Some(name)) if !name.is_empty() => Ok(SpreadsheetTarget::Name(name.clone())),
            _ => bail!("no spreadsheet configured (set GOOGLE_SPREADSHEET_ID or GOOGLE_SPREADSHEET_NAME)"),
        }
    }
}

impl Config {
    /// Overlay environment variables on top of the file values.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |field: &mut String, key: &str| {
            if let Some(v) = var(key).filter(|v| !v.is_empty()) {
                *field = v;
            }
        };
        set(&mut self.lending_club.email, "LENDING_CLUB_EMAIL");
        set(&mut self.lending_club.password, "LENDING_CLUB_PASSWORD");
        set(&mut self.google.client_id, "CLIENT_ID");
        set(&mut self.google.client_secret, "CLIENT_SECRET");
        set(&mut self.google.refresh_token, "REFRESH_TOKEN");
        set(&mut self.google.worksheet, "GOOGLE_WORKSHEET_NAME");

        if let Some(id) = var("GOOGLE_SPREADSHEET_ID").filter(|v| !v.is_empty()) {
            self.google.spreadsheet_id = Some(id);
        }
        if let Some(name) = var("GOOGLE_SPREADSHEET_NAME").filter(|v| !v.is_empty()) {
            self.google.spreadsheet_name = Some(name);
        }
    }

    /// Copy with secrets replaced, for `tally config show`.
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();
        for secret in [
            &mut cfg.lending_club.password,
            &mut cfg.google.client_secret,
            &mut cfg.google.refresh_token,
        ] {
            if !secret.is_empty() {
                *secret = "********".to_string();
            }
        }
        cfg
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

/// `~/.tally/config.toml` (defaults when absent) plus the environment.
pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let mut cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        toml::from_str(&s).context("parse config.toml")?
    } else {
        Config::default()
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tally_finance::FormulaNotation;

    #[test]
    fn test_env_overrides_file() {
        let mut cfg: Config = toml::from_str(
            r#"
[lending_club]
email = "file@example.com"

[google]
spreadsheet_name = "Investments"
worksheet = "LC"

[sheet]
notation = "r1c1"
"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("LENDING_CLUB_EMAIL", "env@example.com"),
            ("LENDING_CLUB_PASSWORD", "hunter2"),
            ("GOOGLE_SPREADSHEET_ID", "abc123"),
            ("GOOGLE_WORKSHEET_NAME", ""),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.lending_club.email, "env@example.com");
        assert_eq!(cfg.lending_club.password, "hunter2");
        assert_eq!(cfg.google.worksheet, "LC");
        assert_eq!(cfg.google.target().unwrap(), SpreadsheetTarget::Id("abc123".to_string()));
        assert_eq!(cfg.sheet.notation, FormulaNotation::R1C1);
        assert_eq!(cfg.sheet.deposits_column, 3);
        assert_eq!(cfg.statement, LendingClubLayout::default());
    }

    #[test]
    fn test_target_requires_id_or_name() {
        let cfg = Config::default();
        assert!(cfg.google.target().is_err());
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut cfg = Config::default();
        cfg.lending_club.password = "hunter2".to_string();
        let shown = toml::to_string(&cfg.redacted()).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("********"));
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.sheet, SheetLayout::default());
        assert_eq!(back.google.worksheet, "Sheet1");
    }
}
