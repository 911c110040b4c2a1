//! capflow CLI: trigger the selection and return jobs against a SQLite store.
//!
//! Commands:
//! - `init-db`: create the database schema
//! - `select --date D`: rebalance every configured strategy on `D`
//! - `returns --date D`: compute returns on `D`
//! - `backfill --from A --to B`: compute returns for every weekday in `[A, B]`
//!
//! Usage: `capflow --config capflow.toml select --date 2022-07-08`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use capflow::{
    model::{Engine, EngineConfig, JobReport},
    store::{JsonLinesSink, SqliteStore},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type SqliteEngine = Engine<SqliteStore, SqliteStore, JsonLinesSink>;

#[derive(Parser)]
#[command(name = "capflow", about = "capflow: inflow-factor long/short portfolio engine")]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables.
    InitDb,
    /// Select long and short portfolios for the week of a reference date.
    Select {
        /// Reference date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,
    },
    /// Compute the returns of every strategy on one date.
    Returns {
        /// Evaluation date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,
    },
    /// Compute returns for every weekday in a range, oldest first.
    Backfill {
        /// First date (YYYY-MM-DD).
        #[arg(long)]
        from: NaiveDate,

        /// Last date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: NaiveDate,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::InitDb => {
            SqliteStore::open(&config.storage.database)?;
            info!(path = %config.storage.database.display(), "database ready");
            Ok(())
        }
        Commands::Select { date } => {
            let report = open_engine(config)?.select_portfolios(date)?;
            finish(&report)
        }
        Commands::Returns { date } => {
            let report = open_engine(config)?.compute_returns(date);
            finish(&report)
        }
        Commands::Backfill { from, to } => {
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            let reports = open_engine(config)?.compute_returns_range(from, to);
            let failed: Vec<NaiveDate> = reports
                .iter()
                .filter(|r| !r.is_success() && !r.is_non_trading_day())
                .map(|r| r.date)
                .collect();
            if !failed.is_empty() {
                bail!("returns failed on {} of {} dates: {failed:?}", failed.len(), reports.len());
            }
            Ok(())
        }
    }
}

fn open_engine(config: EngineConfig) -> Result<SqliteEngine> {
    let database = &config.storage.database;
    let market = SqliteStore::open(database)
        .with_context(|| format!("open market data store {}", database.display()))?;
    let portfolios = SqliteStore::open(database)
        .with_context(|| format!("open portfolio store {}", database.display()))?;
    let sink = JsonLinesSink::open(&config.storage.report_log)?;
    Ok(Engine::new(config, market, portfolios, sink)?)
}

/// Log each strategy's outcome; fail unless every strategy completed or the
/// date had nothing to compute.
fn finish(report: &JobReport) -> Result<()> {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(summary) => info!(
                strategy = %outcome.strategy,
                written = summary.written,
                attempted = summary.attempted,
                published = summary.published,
                "done"
            ),
            Err(err) if err.is_non_trading_day() => {
                info!(strategy = %outcome.strategy, "nothing to compute");
            }
            Err(err) if err.is_recoverable() => warn!(strategy = %outcome.strategy, %err, "failed"),
            Err(err) => error!(strategy = %outcome.strategy, %err, "failed"),
        }
    }

    if report.is_success() || report.is_non_trading_day() {
        Ok(())
    } else {
        let total = report.outcomes.len();
        bail!("{} of {total} strategies failed on {}", report.failed(), report.date)
    }
}
