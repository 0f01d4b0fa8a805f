use anyhow::{Result, bail};

use crate::config::PIPELINE;
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::models::{GridRow, MergedRow};
use crate::utils::{maths_utils, vec_utils};

/// Reindex merged rows onto an evenly spaced grid starting at the first row.
///
/// The grid runs from the first timestamp to the last tick at or before the last
/// timestamp. Observations that fall between ticks are dropped, ticks without an
/// observation are synthesized empty. Afterwards only `price` is forward-filled;
/// `market_cap` and `total_volume` keep their gaps.
///
/// Fails when the span would need more than `PIPELINE.max_grid_ticks` ticks.
pub fn resample_to_grid(merged: &[MergedRow], interval_ms: i64) -> Result<Vec<GridRow>> {
    if interval_ms <= 0 {
        bail!("Grid interval must be positive, got {}ms", interval_ms);
    }
    let (Some(first), Some(last)) = (merged.first(), merged.last()) else {
        return Ok(Vec::new());
    };
    debug_assert!(
        merged.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms),
        "merged rows must be strictly ascending"
    );

    let coin = first.coin.as_str();
    let first_ms = first.timestamp_ms;
    let ticks = match maths_utils::ticks_spanning(first_ms, last.timestamp_ms, interval_ms) {
        Some(ticks) if ticks <= PIPELINE.max_grid_ticks => ticks,
        _ => bail!(
            "{}: span {}..{} does not fit a grid of at most {} ticks",
            coin,
            first_ms,
            last.timestamp_ms,
            PIPELINE.max_grid_ticks
        ),
    };

    let mut grid: Vec<GridRow> = (0..ticks)
        .map(|i| GridRow::empty_tick(coin, first_ms + i as i64 * interval_ms))
        .collect();

    let mut off_grid = 0usize;
    for row in merged {
        match maths_utils::index_on_grid(first_ms, row.timestamp_ms, interval_ms) {
            Some(index) if index < ticks => grid[index] = GridRow::from(row),
            _ => off_grid += 1,
        }
    }

    let mut prices: Vec<Option<f64>> = grid.iter().map(|row| row.price).collect();
    let filled = vec_utils::fill_forward_mut(&mut prices);
    for (row, price) in grid.iter_mut().zip(prices) {
        row.price = price;
    }

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_grid_stats {
        let caps: Vec<Option<f64>> = grid.iter().map(|row| row.market_cap).collect();
        log::debug!(
            "{}: {} ticks, {} prices forward-filled, {} off-grid observations dropped, {:.1}% market caps missing",
            coin,
            ticks,
            filled,
            off_grid,
            vec_utils::count_pct_missing_elements(&caps)
        );
    }
    #[cfg(not(debug_assertions))]
    let _ = (filled, off_grid);

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: i64 = 3_600_000;

    fn merged(ts: i64, price: Option<f64>, cap: Option<f64>) -> MergedRow {
        MergedRow {
            coin: "bitcoin".to_string(),
            timestamp_ms: ts,
            price,
            market_cap: cap,
            total_volume: cap.map(|c| c / 100.0),
        }
    }

    #[test]
    fn grid_is_gap_free_at_the_configured_frequency() {
        let rows = vec![
            merged(0, Some(1.0), None),
            merged(3 * H, Some(2.0), None),
            merged(7 * H, Some(3.0), None),
        ];
        let grid = resample_to_grid(&rows, H).unwrap();
        let (first, last) = (grid[0].timestamp_ms, grid[grid.len() - 1].timestamp_ms);
        assert_eq!(grid.len() as i64, (last - first) / H + 1);
        assert_eq!(grid.len(), 8);
        assert!(grid.windows(2).all(|w| w[1].timestamp_ms - w[0].timestamp_ms == H));
        assert!(grid.iter().all(|r| r.coin == "bitcoin"));
    }

    #[test]
    fn price_is_forward_filled_but_cap_and_volume_are_not() {
        let rows = vec![
            merged(0, Some(100.0), Some(1.0e9)),
            merged(2 * H, Some(121.0), Some(1.2e9)),
        ];
        let grid = resample_to_grid(&rows, H).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1].timestamp_ms, H);
        assert_eq!(grid[1].price, Some(100.0));
        assert_eq!(grid[1].market_cap, None);
        assert_eq!(grid[1].total_volume, None);
        assert_eq!(grid[2].market_cap, Some(1.2e9));
    }

    #[test]
    fn leading_tick_without_price_stays_null() {
        let rows = vec![merged(0, None, Some(5.0)), merged(H, Some(10.0), None)];
        let grid = resample_to_grid(&rows, H).unwrap();
        assert_eq!(grid[0].price, None);
        assert_eq!(grid[0].market_cap, Some(5.0));
        assert_eq!(grid[1].price, Some(10.0));
    }

    #[test]
    fn off_grid_observations_are_dropped() {
        let rows = vec![
            merged(0, Some(1.0), None),
            merged(H / 2, Some(50.0), Some(9.0)),
            merged(H + H / 2, Some(60.0), None),
        ];
        let grid = resample_to_grid(&rows, H).unwrap();
        // Last tick is the one at or before the final observation
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1].price, Some(1.0));
        assert_eq!(grid[1].market_cap, None);
    }

    #[test]
    fn single_row_and_empty_input() {
        let one = vec![merged(5 * H, Some(7.0), None)];
        let grid = resample_to_grid(&one, H).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].price, Some(7.0));

        assert!(resample_to_grid(&[], H).unwrap().is_empty());
        assert!(resample_to_grid(&one, 0).is_err());
    }

    #[test]
    fn oversized_span_is_an_error() {
        let extreme = vec![
            merged(-9_000_000_000_000_000_000, Some(1.0), None),
            merged(9_000_000_000_000_000_000, Some(2.0), None),
        ];
        assert!(resample_to_grid(&extreme, H).is_err());

        let too_wide = vec![
            merged(0, Some(1.0), None),
            merged(PIPELINE.max_grid_ticks as i64 * H, Some(2.0), None),
        ];
        assert!(resample_to_grid(&too_wide, H).is_err());
    }
}
