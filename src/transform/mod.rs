//! Per-coin normalization: raw chart -> merged rows -> fixed grid -> derived analytics.
//! Every stage is a pure function of its input.

pub mod features;
pub mod merger;
pub mod resampler;

pub use features::derive_features;
pub use merger::merge_market_chart;
pub use resampler::resample_to_grid;

use anyhow::Result;

use crate::config::PipelineSettings;
use crate::data::market_chart::MarketChart;
use crate::models::DerivedRow;

/// Run all three stages for one coin.
pub fn derive_coin_frame(
    chart: &MarketChart,
    coin: &str,
    settings: &PipelineSettings,
) -> Result<Vec<DerivedRow>> {
    let merged = merge_market_chart(chart, coin);
    let grid = resample_to_grid(&merged, settings.interval_ms)?;
    Ok(derive_features(&grid, settings.window_ticks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::market_chart::RawPoint;

    const H: i64 = 3_600_000;

    fn chart() -> MarketChart {
        MarketChart {
            prices: vec![
                RawPoint::new(2 * H, 121.0),
                RawPoint::new(0, 100.0),
                RawPoint::new(H, 110.0),
                RawPoint::new(5 * H, 90.0),
            ],
            market_caps: vec![RawPoint::new(0, 1.0e9), RawPoint::new(5 * H, 0.9e9)],
            total_volumes: vec![RawPoint::new(H, 3.0e6)],
        }
    }

    #[test]
    fn rerunning_the_stages_is_idempotent() {
        let settings = PipelineSettings::default();
        let first = derive_coin_frame(&chart(), "bitcoin", &settings).unwrap();
        let second = derive_coin_frame(&chart(), "bitcoin", &settings).unwrap();
        assert_eq!(first.len(), 6);

        let bits = |rows: &[DerivedRow]| -> Vec<Option<u64>> {
            rows.iter()
                .flat_map(|r| {
                    [r.price, r.return_1h, r.log_return_1h, r.ma_24h, r.volatility_24h, r.momentum_24h]
                })
                .map(|v| v.map(f64::to_bits))
                .collect()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn empty_chart_gives_empty_output_at_every_stage() {
        let settings = PipelineSettings::default();
        let empty = MarketChart::default();
        let merged = merge_market_chart(&empty, "bitcoin");
        assert!(merged.is_empty());
        let grid = resample_to_grid(&merged, settings.interval_ms).unwrap();
        assert!(grid.is_empty());
        assert!(derive_features(&grid, settings.window_ticks).is_empty());
        assert!(derive_coin_frame(&empty, "bitcoin", &settings).unwrap().is_empty());
    }
}
