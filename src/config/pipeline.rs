//! Grid and rolling-window configuration

use anyhow::{Result, bail};
use std::time::Duration;

use crate::config::COINGECKO;
use crate::config::coingecko::ChartRequest;
use crate::utils::TimeUtils;

/// The Master Pipeline Configuration
pub struct PipelineConfig {
    // Width of one grid tick. Every coin is resampled onto this frequency.
    pub interval_ms: i64,
    // Trailing window (in ticks) for ma/volatility/momentum. 24 ticks = 24h at hourly frequency.
    pub window_ticks: usize,
    // Upper bound on one coin's grid. A wider span means corrupt timestamps, not history.
    pub max_grid_ticks: usize,
    // Coins fetched when none are given on the command line
    pub default_coins: &'static [&'static str],
}

pub const PIPELINE: PipelineConfig = PipelineConfig {
    interval_ms: TimeUtils::MS_IN_H,
    window_ticks: 24,
    max_grid_ticks: 1_000_000,
    default_coins: &["bitcoin", "ethereum", "solana", "cardano", "ripple"],
};

/// Runtime settings for one pipeline run: the const defaults, possibly overridden from the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub interval_ms: i64,
    pub window_ticks: usize,
    pub vs_currency: String,
    pub days: u32,
    pub pause: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            interval_ms: PIPELINE.interval_ms,
            window_ticks: PIPELINE.window_ticks,
            vs_currency: COINGECKO.vs_currency.to_string(),
            days: COINGECKO.days,
            pause: Duration::from_millis(COINGECKO.pause_ms),
        }
    }
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms <= 0 {
            bail!("Grid interval must be positive, got {}ms", self.interval_ms);
        }
        if self.window_ticks == 0 {
            bail!("Rolling window must cover at least one tick");
        }
        if self.vs_currency.trim().is_empty() {
            bail!("vs-currency code must not be empty");
        }
        if self.days == 0 {
            bail!("History length must be at least one day");
        }
        Ok(())
    }

    pub fn chart_request(&self) -> ChartRequest {
        ChartRequest {
            vs_currency: self.vs_currency.clone(),
            days: self.days,
            pause: self.pause,
        }
    }
}
