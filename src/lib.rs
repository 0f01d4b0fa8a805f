#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod transform;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use analysis::{CombinedDataset, CorrelationMatrix, HeadlineMetrics};
pub use data::{ChartCollection, DerivedStore, MarketChart, MemoizedStore, SqliteStore};
pub use domain::{CoinInterval, MissingData};
pub use engine::{PipelineEngine, RunSummary};
pub use models::DerivedRow;

// CLI argument parsing
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use config::{PERSISTENCE, PIPELINE, PipelineSettings};
use utils::TimeUtils;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite file holding the derived dataset
    #[arg(long, global = true, default_value = PERSISTENCE.dataset.sqlite_path)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch raw charts, normalize them and append the derived rows
    Run(RunArgs),
    /// Print one coin's rows over a date range
    View {
        /// Coin identifier (defaults to bitcoin, or the first coin available)
        coin: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Number of trailing rows to print
        #[arg(long, default_value_t = 24)]
        rows: usize,
    },
    /// Print the headline metrics of a coin's most recent tick
    Latest { coin: Option<String> },
    /// Print the log-return correlation matrix over a date range
    Corr {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Drop all but the newest ingestion of every (coin, timestamp)
    Dedupe,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Coins to fetch (comma separated)
    #[arg(value_delimiter = ',')]
    pub coins: Vec<String>,

    /// Use API as primary source instead of the local cache
    #[arg(long, default_value_t = false)]
    pub prefer_api: bool,

    /// Grid width in minutes
    #[arg(long)]
    pub interval_minutes: Option<i64>,

    /// Rolling window length in ticks
    #[arg(long)]
    pub window: Option<usize>,

    #[arg(long)]
    pub vs_currency: Option<String>,

    /// Days of history to request
    #[arg(long)]
    pub days: Option<u32>,

    /// Pause between per-coin fetches
    #[arg(long)]
    pub pause_ms: Option<u64>,

    /// Remove duplicate ingestions after writing
    #[arg(long, default_value_t = false)]
    pub dedupe: bool,
}

impl RunArgs {
    pub fn coins(&self) -> Vec<String> {
        if self.coins.is_empty() {
            PIPELINE.default_coins.iter().map(|c| c.to_string()).collect()
        } else {
            self.coins.iter().map(|c| c.trim().to_lowercase()).collect()
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        PipelineSettings {
            interval_ms: self
                .interval_minutes
                .map_or(defaults.interval_ms, |m| m * TimeUtils::MS_IN_MIN),
            window_ticks: self.window.unwrap_or(defaults.window_ticks),
            vs_currency: self.vs_currency.clone().unwrap_or(defaults.vs_currency),
            days: self.days.unwrap_or(defaults.days),
            pause: self.pause_ms.map_or(defaults.pause, Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_override_defaults() {
        let cli = Cli::parse_from([
            "coin-grid",
            "run",
            "Bitcoin,ethereum",
            "--interval-minutes",
            "15",
            "--window",
            "4",
        ]);
        let Command::Run(run) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run.coins(), vec!["bitcoin", "ethereum"]);
        let settings = run.settings();
        assert_eq!(settings.interval_ms, TimeUtils::MS_IN_15_MIN);
        assert_eq!(settings.window_ticks, 4);
        assert_eq!(settings.days, PipelineSettings::default().days);
    }

    #[test]
    fn run_without_coins_uses_default_list() {
        let cli = Cli::parse_from(["coin-grid", "--db", "x.sqlite", "run"]);
        let Command::Run(run) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run.coins().len(), PIPELINE.default_coins.len());
        assert_eq!(cli.db, PathBuf::from("x.sqlite"));
    }

    #[test]
    fn view_parses_dates() {
        let cli = Cli::parse_from(["coin-grid", "view", "ethereum", "--from", "2024-01-01"]);
        match cli.command {
            Command::View { coin, from, to, rows } => {
                assert_eq!(coin.as_deref(), Some("ethereum"));
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(to, None);
                assert_eq!(rows, 24);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
