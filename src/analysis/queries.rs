//! Read-side queries for the presentation layer.

use chrono::NaiveDate;

use crate::analysis::CombinedDataset;
use crate::domain::MissingData;
use crate::models::DerivedRow;
use crate::utils::time_utils::{date_window_ms, utc_date_of};

/// Rows of `coin` inside the inclusive window, ascending by timestamp.
pub fn coin_view(
    dataset: &CombinedDataset,
    coin: &str,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<DerivedRow>, MissingData> {
    if !dataset.rows.iter().any(|r| r.coin == coin) {
        return Err(MissingData::UnknownCoin {
            coin: coin.to_string(),
        });
    }
    let mut view: Vec<DerivedRow> = dataset
        .rows_in_window(start_ms, end_ms)
        .filter(|r| r.coin == coin)
        .cloned()
        .collect();
    if view.is_empty() {
        return Err(MissingData::EmptyWindow { start_ms, end_ms });
    }
    view.sort_by_key(|r| r.timestamp_ms);
    Ok(view)
}

/// Most recent row of `coin` across the whole dataset.
pub fn latest_row<'a>(dataset: &'a CombinedDataset, coin: &str) -> Result<&'a DerivedRow, MissingData> {
    dataset
        .rows
        .iter()
        .filter(|r| r.coin == coin)
        .max_by_key(|r| r.timestamp_ms)
        .ok_or_else(|| MissingData::UnknownCoin {
            coin: coin.to_string(),
        })
}

/// The trailing `n` rows of a sorted view.
pub fn recent_rows(view: &[DerivedRow], n: usize) -> &[DerivedRow] {
    &view[view.len().saturating_sub(n)..]
}

/// Millisecond window for a date range, with open ends defaulting to the first and
/// last UTC dates present in the dataset. `None` when the dataset is empty.
pub fn resolve_date_window(
    dataset: &CombinedDataset,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Option<(i64, i64)> {
    let (min_ms, max_ms) = dataset.time_span_ms()?;
    let from = from.or_else(|| utc_date_of(min_ms))?;
    let to = to.or_else(|| utc_date_of(max_ms))?;
    Some(date_window_ms(from, to))
}

/// Headline numbers for one coin. `None` fields render as "N/A", never as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlineMetrics {
    pub coin: String,
    pub timestamp_ms: i64,
    pub price: Option<f64>,
    pub return_1h_pct: Option<f64>,
    pub ma_24h: Option<f64>,
    pub volatility_24h: Option<f64>,
    pub momentum_24h: Option<f64>,
}

impl From<&DerivedRow> for HeadlineMetrics {
    fn from(row: &DerivedRow) -> Self {
        Self {
            coin: row.coin.clone(),
            timestamp_ms: row.timestamp_ms,
            price: row.price,
            return_1h_pct: row.return_1h.map(|r| r * 100.0),
            ma_24h: row.ma_24h,
            volatility_24h: row.volatility_24h,
            momentum_24h: row.momentum_24h,
        }
    }
}
