//! File persistence and serialization configuration

use std::time::Duration;

pub struct RawChartCacheConfig {
    pub directory: &'static str,
    pub filename_without_ext: &'static str,
    /// Bumped whenever the bincode layout of the cache changes
    pub version: f64,
    /// Maximum age of a cached fetch before the API is preferred (seconds)
    pub acceptable_age_secs: i64,
}

pub struct DatasetConfig {
    pub sqlite_path: &'static str,
    pub table_name: &'static str,
    /// Staleness bound for the in-process dataset memo
    pub memo_ttl: Duration,
}

pub struct PersistenceConfig {
    pub raw_charts: RawChartCacheConfig,
    pub dataset: DatasetConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    raw_charts: RawChartCacheConfig {
        directory: "data/raw_charts",
        filename_without_ext: "market_charts",
        version: 1.0,
        acceptable_age_secs: 3_600,
    },
    dataset: DatasetConfig {
        sqlite_path: "data/crypto_data.sqlite",
        table_name: "crypto_prices",
        memo_ttl: Duration::from_secs(300),
    },
};

/// Request-specific cache filename
/// Example: "market_charts_usd_30d_v1.bin" (an f64 version of 1.0 prints as "1")
pub fn raw_chart_cache_filename(vs_currency: &str, days: u32) -> String {
    format!(
        "{}_{}_{}d_v{}.bin",
        PERSISTENCE.raw_charts.filename_without_ext,
        vs_currency.to_lowercase(),
        days,
        PERSISTENCE.raw_charts.version
    )
}
