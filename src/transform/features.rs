use crate::models::{DerivedRow, GridRow};
use crate::utils::maths_utils;

/// Simple return between two consecutive ticks. Non-finite ratios (a zero
/// previous price) surface as NaN.
fn simple_return(prev: Option<f64>, current: Option<f64>) -> Option<f64> {
    let (prev, current) = (prev?, current?);
    let ratio = current / prev - 1.0;
    Some(if ratio.is_finite() { ratio } else { f64::NAN })
}

/// `ln(1 + r)`. NaN when `1 + r <= 0`, so a corrupt sample never becomes a real number.
fn log_return(simple: Option<f64>) -> Option<f64> {
    let r = simple?;
    Some(if 1.0 + r > 0.0 { r.ln_1p() } else { f64::NAN })
}

fn momentum(price: Option<f64>, mean: Option<f64>) -> Option<f64> {
    let (price, mean) = (price?, mean?);
    if mean == 0.0 {
        return Some(f64::NAN);
    }
    Some(price / mean - 1.0)
}

/// Derive returns and trailing-window statistics for one coin's grid.
///
/// Windows grow then slide: row `i` looks at ticks `[i + 1 - window, i]` clipped at 0,
/// and emits a value as soon as one usable sample is inside (two for the standard deviation).
/// Missing and NaN samples are skipped by the window statistics.
pub fn derive_features(grid: &[GridRow], window_ticks: usize) -> Vec<DerivedRow> {
    debug_assert!(window_ticks > 0, "window must cover at least one tick");
    let window = window_ticks.max(1);

    let prices: Vec<Option<f64>> = grid.iter().map(|row| row.price).collect();
    let returns: Vec<Option<f64>> = (0..grid.len())
        .map(|i| if i == 0 { None } else { simple_return(prices[i - 1], prices[i]) })
        .collect();
    let log_returns: Vec<Option<f64>> = returns.iter().map(|r| log_return(*r)).collect();

    grid.iter()
        .enumerate()
        .map(|(i, row)| {
            let start = (i + 1).saturating_sub(window);
            let ma = maths_utils::mean_of_usable(&prices[start..=i]);
            let volatility = maths_utils::sample_std_of_usable(&log_returns[start..=i]);
            DerivedRow {
                coin: row.coin.clone(),
                timestamp_ms: row.timestamp_ms,
                price: row.price,
                market_cap: row.market_cap,
                total_volume: row.total_volume,
                return_1h: returns[i],
                log_return_1h: log_returns[i],
                ma_24h: ma,
                volatility_24h: volatility,
                momentum_24h: momentum(row.price, ma),
            }
        })
        .collect()
}
