use std::collections::BTreeMap;
use strum::IntoEnumIterator;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::data::market_chart::MarketChart;
use crate::domain::RawKind;
use crate::models::MergedRow;

/// Outer-join the three raw sequences of `chart` on timestamp.
///
/// * a timestamp present in any sequence yields exactly one row
/// * within one sequence, the first value seen for a timestamp wins; later duplicates are dropped
/// * rows come out ascending by timestamp, each tagged with `coin`
pub fn merge_market_chart(chart: &MarketChart, coin: &str) -> Vec<MergedRow> {
    let mut by_timestamp: BTreeMap<i64, MergedRow> = BTreeMap::new();
    let mut duplicates = 0usize;

    for kind in RawKind::iter() {
        for point in chart.series(kind) {
            let row = by_timestamp
                .entry(point.timestamp_ms)
                .or_insert_with(|| MergedRow {
                    coin: coin.to_string(),
                    timestamp_ms: point.timestamp_ms,
                    price: None,
                    market_cap: None,
                    total_volume: None,
                });
            let slot = match kind {
                RawKind::Price => &mut row.price,
                RawKind::MarketCap => &mut row.market_cap,
                RawKind::TotalVolume => &mut row.total_volume,
            };
            if slot.is_some() {
                duplicates += 1;
                continue;
            }
            *slot = Some(point.value);
        }
    }

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_grid_stats && duplicates > 0 {
        log::debug!("{}: dropped {} duplicate raw observations", coin, duplicates);
    }
    #[cfg(not(debug_assertions))]
    let _ = duplicates;

    by_timestamp.into_values().collect()
}
