pub mod cache_file;
pub mod coingecko;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use strum::IntoEnumIterator;

use crate::config::ChartRequest;
use crate::domain::RawKind;
use crate::utils::time_utils::epoch_ms_to_datetime;

/// One `(epoch-ms, value)` sample of a raw sequence.
/// A value that could not be read as a number is kept as NaN.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RawPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl RawPoint {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// The three raw sequences fetched for one coin. Any of them may be empty,
/// none of them is assumed sorted or unique. The coin identifier is not part of
/// the payload: it is attached by the merger.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MarketChart {
    pub prices: Vec<RawPoint>,
    pub market_caps: Vec<RawPoint>,
    pub total_volumes: Vec<RawPoint>,
}

impl MarketChart {
    pub fn series(&self, kind: RawKind) -> &[RawPoint] {
        match kind {
            RawKind::Price => &self.prices,
            RawKind::MarketCap => &self.market_caps,
            RawKind::TotalVolume => &self.total_volumes,
        }
    }

    fn series_mut(&mut self, kind: RawKind) -> &mut Vec<RawPoint> {
        match kind {
            RawKind::Price => &mut self.prices,
            RawKind::MarketCap => &mut self.market_caps,
            RawKind::TotalVolume => &mut self.total_volumes,
        }
    }

    pub fn is_empty(&self) -> bool {
        RawKind::iter().all(|kind| self.series(kind).is_empty())
    }

    pub fn observation_count(&self) -> usize {
        RawKind::iter().map(|kind| self.series(kind).len()).sum()
    }
}

/// What had to be coerced or skipped while reading a market-chart document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChartParseReport {
    /// Entries kept with a NaN value because the value was not numeric
    pub coerced_values: usize,
    /// Entries dropped because no timestamp could be read
    pub skipped_entries: usize,
}

impl RawChartParseReport {
    pub fn is_clean(&self) -> bool {
        self.coerced_values == 0 && self.skipped_entries == 0
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Epoch milliseconds, only when whole and representable as a UTC date-time.
fn coerce_timestamp_ms(value: &Value) -> Option<i64> {
    let ms = match value.as_i64() {
        Some(ms) => ms,
        None => {
            let ms = coerce_number(value)?;
            if !ms.is_finite() || ms.fract() != 0.0 || ms < i64::MIN as f64 || ms >= i64::MAX as f64 {
                return None;
            }
            ms as i64
        }
    };
    epoch_ms_to_datetime(ms).map(|_| ms)
}

/// Read a market-chart JSON document (`{"prices": [[ts, v], ...], "market_caps": ..., "total_volumes": ...}`).
/// Missing keys yield empty sequences. Non-numeric values become NaN; entries
/// without a readable timestamp are skipped. Both are counted in the report.
pub fn parse_market_chart(doc: &Value) -> (MarketChart, RawChartParseReport) {
    let mut chart = MarketChart::default();
    let mut report = RawChartParseReport::default();

    for kind in RawKind::iter() {
        let Some(entries) = doc.get(kind.as_ref()).and_then(Value::as_array) else {
            continue;
        };
        let target = chart.series_mut(kind);
        target.reserve(entries.len());
        for entry in entries {
            let pair = entry.as_array();
            let timestamp = pair
                .and_then(|p| p.first())
                .and_then(coerce_timestamp_ms);
            let Some(timestamp_ms) = timestamp else {
                report.skipped_entries += 1;
                continue;
            };
            let value = match pair.and_then(|p| p.get(1)).and_then(coerce_number) {
                Some(v) => v,
                None => {
                    report.coerced_values += 1;
                    f64::NAN
                }
            };
            target.push(RawPoint::new(timestamp_ms, value));
        }
    }

    (chart, report)
}

// ============================================================================
// Retrieval seams
// ============================================================================

#[derive(Debug)]
pub enum ChartFetchError {
    Http { coin: String, reason: String },
    Status { coin: String, status: u16 },
    Decode { coin: String, reason: String },
}

impl std::error::Error for ChartFetchError {}
impl fmt::Display for ChartFetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChartFetchError::Http { coin, reason } => {
                write!(f, "{}: request failed: {}", coin, reason)
            }
            ChartFetchError::Status { coin, status } => {
                write!(f, "{}: API returned HTTP {}", coin, status)
            }
            ChartFetchError::Decode { coin, reason } => {
                write!(f, "{}: could not decode market chart: {}", coin, reason)
            }
        }
    }
}

/// Fetches the raw market chart of a single coin.
#[async_trait]
pub trait MarketChartFetcher: Send + Sync {
    async fn fetch_market_chart(
        &self,
        coin: &str,
        request: &ChartRequest,
    ) -> Result<MarketChart, ChartFetchError>;
}

/// Raw charts for a set of coins, keyed by coin identifier.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ChartCollection {
    pub name: String, // Metadata e.g. "CoinGecko market charts"
    pub charts: BTreeMap<String, MarketChart>,
}

impl ChartCollection {
    pub fn coins(&self) -> BTreeSet<&str> {
        self.charts.keys().map(String::as_str).collect()
    }

    pub fn covers(&self, coins: &[String]) -> bool {
        coins.iter().all(|c| self.charts.contains_key(c))
    }

    pub fn retain_coins(&mut self, coins: &[String]) {
        self.charts.retain(|coin, _| coins.contains(coin));
    }
}

#[async_trait]
pub trait CreateChartCollection: Send + Sync {
    /// Either load charts for `coins` OR return an anyhow::Error
    async fn create_chart_collection(
        &self,
        coins: &[String],
        request: &ChartRequest,
    ) -> Result<ChartCollection>;

    /// A unique identifier for this implementation (so that afterwards we know which one we used).
    fn signature(&self) -> &'static str;
}

/// Try each provider in order; the first success wins.
pub async fn get_chart_collection_async(
    providers: &[Box<dyn CreateChartCollection>],
    coins: &[String],
    request: &ChartRequest,
) -> Result<(ChartCollection, &'static str)> {
    for provider in providers {
        match provider.create_chart_collection(coins, request).await {
            Ok(data) => return Ok((data, provider.signature())),
            Err(e) => {
                log::info!("Error with chart provider {}: {:#}", provider.signature(), e);
            }
        }
    }
    Err(anyhow!("All chart providers failed to load data"))
}

/// Fetch coins one after another with `request.pause` between fetches.
/// A coin whose fetch fails is logged and left out; the others carry on.
pub async fn fetch_multiple_coins<F>(
    fetcher: &F,
    coins: &[String],
    request: &ChartRequest,
) -> ChartCollection
where
    F: MarketChartFetcher + ?Sized,
{
    let mut charts = BTreeMap::new();
    for (i, coin) in coins.iter().enumerate() {
        if i > 0 && !request.pause.is_zero() {
            tokio::time::sleep(request.pause).await;
        }
        match fetcher.fetch_market_chart(coin, request).await {
            Ok(chart) => {
                log::info!(
                    "{}: fetched {} raw observations",
                    coin,
                    chart.observation_count()
                );
                charts.insert(coin.clone(), chart);
            }
            Err(e) => log::error!("Failed to fetch data for {}: {}", coin, e),
        }
    }
    ChartCollection {
        name: "CoinGecko market charts".to_string(),
        charts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn parses_all_three_sequences() {
        let doc = json!({
            "prices": [[1_000, 100.5], [2_000, 101.0]],
            "market_caps": [[1_000, 5.0e9]],
            "total_volumes": [[2_000, 7.0e6]]
        });
        let (chart, report) = parse_market_chart(&doc);
        assert!(report.is_clean());
        assert_eq!(chart.prices, vec![RawPoint::new(1_000, 100.5), RawPoint::new(2_000, 101.0)]);
        assert_eq!(chart.market_caps.len(), 1);
        assert_eq!(chart.total_volumes[0].timestamp_ms, 2_000);
    }

    #[test]
    fn missing_keys_are_empty_sequences() {
        let (chart, report) = parse_market_chart(&json!({ "prices": [] }));
        assert!(chart.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn non_numeric_values_become_nan_and_bad_timestamps_are_skipped() {
        let doc = json!({
            "prices": [[1_000, "abc"], [2_000, null], ["oops", 3.0], [3_000, "42.5"], [4_000.0, 1.0]]
        });
        let (chart, report) = parse_market_chart(&doc);
        assert_eq!(report.coerced_values, 2);
        assert_eq!(report.skipped_entries, 1);
        assert_eq!(chart.prices.len(), 4);
        assert!(chart.prices[0].value.is_nan());
        assert!(chart.prices[1].value.is_nan());
        assert_eq!(chart.prices[2], RawPoint::new(3_000, 42.5));
        assert_eq!(chart.prices[3], RawPoint::new(4_000, 1.0));
    }

    #[test]
    fn unrepresentable_timestamps_are_skipped() {
        let doc = json!({
            "prices": [[1e300, 1.0], [9_000_000_000_000_000_000i64, 2.0], [-9e18, 3.0], [5_000, 4.0]]
        });
        let (chart, report) = parse_market_chart(&doc);
        assert_eq!(report.skipped_entries, 3);
        assert_eq!(chart.prices, vec![RawPoint::new(5_000, 4.0)]);
    }

    struct FlakyFetcher;

    #[async_trait]
    impl MarketChartFetcher for FlakyFetcher {
        async fn fetch_market_chart(
            &self,
            coin: &str,
            _request: &ChartRequest,
        ) -> Result<MarketChart, ChartFetchError> {
            if coin == "broken" {
                return Err(ChartFetchError::Status {
                    coin: coin.to_string(),
                    status: 429,
                });
            }
            Ok(MarketChart {
                prices: vec![RawPoint::new(0, 1.0)],
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn one_failing_coin_does_not_block_the_others() {
        let request = ChartRequest {
            vs_currency: "usd".to_string(),
            days: 1,
            pause: Duration::ZERO,
        };
        let coins = vec!["bitcoin".to_string(), "broken".to_string(), "ethereum".to_string()];
        let collection = fetch_multiple_coins(&FlakyFetcher, &coins, &request).await;
        assert_eq!(
            collection.coins().into_iter().collect::<Vec<_>>(),
            vec!["bitcoin", "ethereum"]
        );
        assert!(!collection.covers(&coins));
    }
}
