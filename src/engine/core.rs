use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use std::time::Instant;

use crate::analysis::{CombinedDataset, combine_coin_frames};
use crate::config::PipelineSettings;
use crate::data::market_chart::cache_file::{RawChartCacheFile, write_raw_charts_locally};
use crate::data::market_chart::{ChartCollection, CreateChartCollection, get_chart_collection_async};
use crate::data::store::DerivedStore;
use crate::domain::{CoinInterval, MissingData};
use crate::models::DerivedRow;
use crate::transform::derive_coin_frame;

/// What happened to one coin during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum CoinOutcome {
    Derived { coin: String, rows: usize },
    NoData(MissingData),
    Failed { coin: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub source: &'static str,
    pub outcomes: Vec<CoinOutcome>,
    pub rows_written: usize,
    pub duplicates_removed: usize,
}

impl RunSummary {
    pub fn derived_coins(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CoinOutcome::Derived { .. }))
            .count()
    }
}

/// Per-coin transforms run in parallel; nothing is combined until every coin is done.
/// One coin's failure or emptiness never affects another.
pub fn transform_collection(
    collection: &ChartCollection,
    settings: &PipelineSettings,
) -> (CombinedDataset, Vec<CoinOutcome>) {
    let results: Vec<(Option<Vec<DerivedRow>>, CoinOutcome)> = collection
        .charts
        .par_iter()
        .map(|(coin, chart)| {
            let coin_interval = CoinInterval::new(coin.as_str(), settings.interval_ms);
            if chart.is_empty() {
                log::warn!("{}: no raw observations, skipping", coin_interval);
                let outcome = CoinOutcome::NoData(MissingData::EmptyRawSeries { coin: coin.clone() });
                return (None, outcome);
            }
            match derive_coin_frame(chart, coin, settings) {
                Ok(rows) => {
                    log::info!("{}: derived {} ticks", coin_interval, rows.len());
                    let outcome = CoinOutcome::Derived {
                        coin: coin.clone(),
                        rows: rows.len(),
                    };
                    (Some(rows), outcome)
                }
                Err(e) => {
                    log::error!("{}: transform failed: {:#}", coin_interval, e);
                    let outcome = CoinOutcome::Failed {
                        coin: coin.clone(),
                        reason: format!("{:#}", e),
                    };
                    (None, outcome)
                }
            }
        })
        .collect();

    let (frames, outcomes): (Vec<_>, Vec<_>) = results.into_iter().unzip();
    (combine_coin_frames(frames.into_iter().flatten()), outcomes)
}

/// Fetch -> transform -> append, with the collaborators injected.
pub struct PipelineEngine<'a> {
    pub settings: PipelineSettings,
    pub providers: Vec<Box<dyn CreateChartCollection>>,
    pub store: &'a dyn DerivedStore,
    /// Run the store's duplicate clean-up after appending
    pub dedupe_after_write: bool,
}

impl PipelineEngine<'_> {
    pub async fn run(&self, coins: &[String]) -> Result<RunSummary> {
        self.settings.validate()?;
        let start_time = Instant::now();
        let request = self.settings.chart_request();

        let (collection, source) = get_chart_collection_async(&self.providers, coins, &request)
            .await
            .context("Could not load raw market charts")?;
        log::info!(
            "Loaded raw charts for {} of {} coins from {}",
            collection.charts.len(),
            coins.len(),
            source
        );

        let cache_path = RawChartCacheFile::default_cache_path(&request);
        if let Err(e) = write_raw_charts_locally(source, &collection, &request, &cache_path) {
            log::warn!("⚠️  Failed to write raw chart cache: {:#}", e);
        }

        let mut outcomes: Vec<CoinOutcome> = coins
            .iter()
            .filter(|coin| !collection.charts.contains_key(*coin))
            .map(|coin| CoinOutcome::Failed {
                coin: coin.clone(),
                reason: "retrieval failed".to_string(),
            })
            .collect();

        let settings = self.settings.clone();
        let (dataset, transformed) =
            tokio::task::spawn_blocking(move || transform_collection(&collection, &settings))
                .await
                .context("Transform task panicked")?;
        outcomes.extend(transformed);

        let rows_written = if dataset.is_empty() {
            log::warn!("Nothing to write: no coin produced derived rows");
            0
        } else {
            self.store.append(&dataset.rows, Utc::now())?
        };
        let duplicates_removed = if self.dedupe_after_write {
            self.store.remove_duplicates()?
        } else {
            0
        };

        log::info!("Pipeline run completed in {:?}", start_time.elapsed());
        Ok(RunSummary {
            source,
            outcomes,
            rows_written,
            duplicates_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::market_chart::{MarketChart, RawPoint};

    const H: i64 = 3_600_000;

    #[test]
    fn empty_coin_is_reported_and_others_are_derived() {
        let mut collection = ChartCollection::default();
        collection.charts.insert(
            "bitcoin".to_string(),
            MarketChart {
                prices: vec![RawPoint::new(0, 100.0), RawPoint::new(2 * H, 121.0)],
                ..Default::default()
            },
        );
        collection
            .charts
            .insert("ghostcoin".to_string(), MarketChart::default());

        let (dataset, outcomes) = transform_collection(&collection, &PipelineSettings::default());
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.coins(), vec!["bitcoin"]);
        assert!(outcomes.contains(&CoinOutcome::Derived {
            coin: "bitcoin".to_string(),
            rows: 3
        }));
        assert!(outcomes.contains(&CoinOutcome::NoData(MissingData::EmptyRawSeries {
            coin: "ghostcoin".to_string()
        })));
    }

    #[test]
    fn bad_settings_fail_the_coin_not_the_run() {
        let mut collection = ChartCollection::default();
        collection.charts.insert(
            "bitcoin".to_string(),
            MarketChart {
                prices: vec![RawPoint::new(0, 1.0)],
                ..Default::default()
            },
        );
        let settings = PipelineSettings {
            interval_ms: 0,
            ..Default::default()
        };
        let (dataset, outcomes) = transform_collection(&collection, &settings);
        assert!(dataset.is_empty());
        assert!(matches!(outcomes[0], CoinOutcome::Failed { .. }));
    }

    #[test]
    fn corrupt_timestamps_fail_only_their_coin() {
        let mut collection = ChartCollection::default();
        collection.charts.insert(
            "bitcoin".to_string(),
            MarketChart {
                prices: vec![RawPoint::new(0, 100.0), RawPoint::new(H, 101.0)],
                ..Default::default()
            },
        );
        collection.charts.insert(
            "corrupt".to_string(),
            MarketChart {
                prices: vec![
                    RawPoint::new(-9_000_000_000_000_000_000, 1.0),
                    RawPoint::new(9_000_000_000_000_000_000, 2.0),
                ],
                ..Default::default()
            },
        );

        let (dataset, outcomes) = transform_collection(&collection, &PipelineSettings::default());
        assert_eq!(dataset.coins(), vec!["bitcoin"]);
        assert!(outcomes.contains(&CoinOutcome::Derived {
            coin: "bitcoin".to_string(),
            rows: 2
        }));
        assert!(
            outcomes
                .iter()
                .any(|o| matches!(o, CoinOutcome::Failed { coin, .. } if coin == "corrupt"))
        );
    }
}
