use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::config::{ChartRequest, PERSISTENCE, raw_chart_cache_filename};
use crate::data::market_chart::{ChartCollection, CreateChartCollection};
use crate::utils::time_utils::how_many_seconds_ago;

/// Serialized wrapper around a previously fetched `ChartCollection`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawChartCacheFile {
    pub version: f64,
    pub timestamp_ms: i64,
    pub vs_currency: String,
    pub days: u32,
    pub data: ChartCollection,
}

impl RawChartCacheFile {
    pub fn new(request: &ChartRequest, data: ChartCollection, version: f64) -> Self {
        Self {
            version,
            timestamp_ms: Utc::now().timestamp_millis(),
            vs_currency: request.vs_currency.clone(),
            days: request.days,
            data,
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).context(format!("Failed to open cache file: {:?}", path))?;
        let mut reader = BufReader::new(file);
        let cache = bincode::deserialize_from(&mut reader)
            .context(format!("Failed to deserialize cache: {:?}", path))?;
        Ok(cache)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        let file =
            File::create(path).context(format!("Failed to create file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)
            .context(format!("Failed to serialize cache to: {}", path.display()))
    }

    pub fn default_cache_path(request: &ChartRequest) -> PathBuf {
        PathBuf::from(PERSISTENCE.raw_charts.directory)
            .join(raw_chart_cache_filename(&request.vs_currency, request.days))
    }

    /// Reject a cache that was written by another layout, for another request,
    /// for fewer coins, or too long ago.
    pub fn check_validity(
        &self,
        request: &ChartRequest,
        coins: &[String],
        version_required: f64,
        recency_required_secs: i64,
    ) -> Result<()> {
        if self.version != version_required {
            bail!(
                "Cache version mismatch: file v{} vs required v{}",
                self.version,
                version_required
            );
        }
        if self.vs_currency != request.vs_currency || self.days != request.days {
            bail!(
                "Cache request mismatch: file has {} / {}d, expected {} / {}d",
                self.vs_currency,
                self.days,
                request.vs_currency,
                request.days
            );
        }
        if !self.data.covers(coins) {
            bail!("Cache does not cover all requested coins");
        }
        let seconds_ago = how_many_seconds_ago(self.timestamp_ms);
        if seconds_ago > recency_required_secs {
            bail!(
                "Cache too old: created {} seconds ago (limit: {} seconds)",
                seconds_ago,
                recency_required_secs
            );
        }
        Ok(())
    }
}

/// Write fetched charts to the cache. Only API-fetched data is worth caching.
pub fn write_raw_charts_locally(
    signature: &'static str,
    collection: &ChartCollection,
    request: &ChartRequest,
    path: &Path,
) -> Result<()> {
    if signature != "CoinGecko API" {
        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_serde {
            log::info!("Skipping cache write (data not from CoinGecko API)");
        }
        return Ok(());
    }

    #[cfg(debug_assertions)]
    let start_time = DEBUG_FLAGS.print_serde.then(|| {
        log::info!("Writing raw chart cache to disk: {:?}...", path);
        std::time::Instant::now()
    });

    let cache = RawChartCacheFile::new(request, collection.clone(), PERSISTENCE.raw_charts.version);
    cache.save_to_path(path)?;

    #[cfg(debug_assertions)]
    if let Some(start) = start_time {
        log::info!(
            "✅ Cache written: {} coins in {:.2}s",
            collection.charts.len(),
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

/// Chart provider backed by the local cache file.
pub struct RawChartCache {
    pub path: PathBuf,
    pub acceptable_age_secs: i64,
}

impl RawChartCache {
    pub fn for_request(request: &ChartRequest) -> Self {
        Self {
            path: RawChartCacheFile::default_cache_path(request),
            acceptable_age_secs: PERSISTENCE.raw_charts.acceptable_age_secs,
        }
    }
}

#[async_trait]
impl CreateChartCollection for RawChartCache {
    fn signature(&self) -> &'static str {
        "Local Cache"
    }

    async fn create_chart_collection(
        &self,
        coins: &[String],
        request: &ChartRequest,
    ) -> Result<ChartCollection> {
        let path = self.path.clone();

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_serde {
            log::info!("Reading raw chart cache from: {:?}...", path);
        }

        let cache = tokio::task::spawn_blocking(move || RawChartCacheFile::load_from_path(&path))
            .await
            .context("Deserialization task panicked")?
            .context("Failed to load cache file")?;

        cache.check_validity(
            request,
            coins,
            PERSISTENCE.raw_charts.version,
            self.acceptable_age_secs,
        )?;

        let mut data = cache.data;
        data.retain_coins(coins);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::market_chart::{MarketChart, RawPoint};
    use std::time::Duration;

    fn request() -> ChartRequest {
        ChartRequest {
            vs_currency: "usd".to_string(),
            days: 30,
            pause: Duration::ZERO,
        }
    }

    fn collection() -> ChartCollection {
        let mut data = ChartCollection::default();
        data.charts.insert(
            "bitcoin".to_string(),
            MarketChart {
                prices: vec![RawPoint::new(0, 100.0), RawPoint::new(3_600_000, f64::NAN)],
                ..Default::default()
            },
        );
        data
    }

    #[test]
    fn round_trips_through_disk_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("charts.bin");
        write_raw_charts_locally("CoinGecko API", &collection(), &request(), &path).unwrap();

        let loaded = RawChartCacheFile::load_from_path(&path).unwrap();
        assert_eq!(loaded.data.charts["bitcoin"].prices[0], RawPoint::new(0, 100.0));
        assert!(loaded.data.charts["bitcoin"].prices[1].value.is_nan());

        let coins = vec!["bitcoin".to_string()];
        let version = PERSISTENCE.raw_charts.version;
        assert!(loaded.check_validity(&request(), &coins, version, 60).is_ok());
        assert!(loaded.check_validity(&request(), &coins, version + 1.0, 60).is_err());

        let more_coins = vec!["bitcoin".to_string(), "ethereum".to_string()];
        assert!(loaded.check_validity(&request(), &more_coins, version, 60).is_err());

        let other = ChartRequest {
            days: 7,
            ..request()
        };
        assert!(loaded.check_validity(&other, &coins, version, 60).is_err());
    }

    #[test]
    fn cached_data_from_other_sources_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts.bin");
        write_raw_charts_locally("Local Cache", &collection(), &request(), &path).unwrap();
        assert!(!path.exists());
    }
}
