use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tally_core::{number_to_letter, Row};
use tally_finance::{
    extrapolate_next, run_sync, CsvSheet, GoogleSheet, LendingClubClient, SheetStore, StatementPeriod, SyncReport,
};
use tally_ingest::{parse_statement, pdf};

mod config;
mod logging;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Copy LendingClub statement figures into your tracking spreadsheet"
)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a monthly statement and append the next spreadsheet row
    Sync {
        /// Statement year (default: last month's)
        #[arg(long, requires = "month")]
        year: Option<i32>,

        /// Statement month 1-12 (default: last month)
        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Compute and print the row without writing it
        #[arg(long)]
        dry_run: bool,

        /// Write to a local CSV sheet instead of Google Sheets
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Parse a statement PDF already on disk and print its figures
    Statement {
        #[arg(long)]
        pdf: PathBuf,
    },

    /// Extrapolate the next row of a local CSV sheet
    Extrapolate {
        #[arg(long)]
        csv: PathBuf,

        /// Value for the deposits column
        #[arg(long)]
        deposits: Option<String>,

        /// Value for the balance column
        #[arg(long)]
        balance: Option<String>,

        /// Append the row to the CSV (default: print only)
        #[arg(long)]
        write: bool,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file
    Init,

    /// Print the effective config (file + environment), secrets hidden
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Sync {
            year,
            month,
            dry_run,
            csv,
        } => {
            let cfg = config::load_config()?;
            let period = match (year, month) {
                (Some(y), Some(m)) => StatementPeriod::new(y, m)?,
                _ => StatementPeriod::previous_month(chrono::Local::now().date_naive()),
            };
            tracing::info!(%period, "starting sync");

            let client = LendingClubClient::new(cfg.lending_club.clone())?;
            let report = match csv {
                Some(path) => {
                    let mut sheet = CsvSheet::new(path);
                    run_sync(&client, &mut sheet, period, &cfg.statement, &cfg.sheet, dry_run).await?
                }
                None => {
                    let mut sheet =
                        GoogleSheet::connect(&cfg.google.credentials(), &cfg.google.target()?, &cfg.google.worksheet)
                            .await?;
                    run_sync(&client, &mut sheet, period, &cfg.statement, &cfg.sheet, dry_run).await?
                }
            };
            print_report(&report)?;
        }

        Command::Statement { pdf: path } => {
            let cfg = config::load_config()?;
            let pages = pdf::extract_pages_from_file(&path)?;
            let summary = parse_statement(&pages, &cfg.statement)
                .with_context(|| format!("parsing {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Extrapolate {
            csv,
            deposits,
            balance,
            write,
        } => {
            let cfg = config::load_config()?;
            if !csv.exists() {
                bail!("CSV not found: {}", csv.display());
            }

            let mut sheet = CsvSheet::new(&csv);
            let rows = sheet.read_rows().await?;
            let (row_number, mut row) = extrapolate_next(&rows, cfg.sheet.notation)?;
            if let Some(d) = deposits {
                row.insert(cfg.sheet.deposits_column, d);
            }
            if let Some(b) = balance {
                row.insert(cfg.sheet.balance_column, b);
            }

            println!("Row {row_number}:");
            print_row(&row)?;
            if write {
                sheet.write_row(row_number, &row).await?;
                println!("\nWrote row {} to {}", row_number, csv.display());
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}\n", config::config_path()?.display());
                println!("{}", toml::to_string_pretty(&cfg.redacted())?);
            }
        },
    }

    Ok(())
}

fn print_report(report: &SyncReport) -> Result<()> {
    println!(
        "Statement: balance={} deposits={}",
        report.summary.balance, report.summary.deposits
    );
    println!("Row {}:", report.row_number);
    print_row(&report.row)?;
    if report.written {
        println!("\nSpreadsheet updated.");
    } else {
        println!("\n(dry run: nothing written)");
    }
    Ok(())
}

fn print_row(row: &Row) -> Result<()> {
    for (col, value) in row.iter() {
        println!("  {:>3}  {}", number_to_letter(col)?.to_uppercase(), value);
    }
    Ok(())
}
