use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::CombinedDataset;
use crate::domain::MissingData;
use crate::utils::maths_utils::{self, usable};

/// Square, symmetric Pearson correlation of `log_return_1h`, indexed by coin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pub coins: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    fn index_of(&self, coin: &str) -> Option<usize> {
        self.coins.iter().position(|c| c == coin)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.values[self.index_of(a)?][self.index_of(b)?])
    }
}

/// Log-returns pivoted to coin -> timestamp -> value. Several rows for the same
/// (coin, timestamp), e.g. duplicated appends, are averaged.
fn pivot_log_returns<'a, I>(rows: I) -> (BTreeSet<String>, BTreeMap<String, BTreeMap<i64, f64>>)
where
    I: Iterator<Item = &'a crate::models::DerivedRow>,
{
    let mut coins = BTreeSet::new();
    let mut sums: BTreeMap<String, BTreeMap<i64, (f64, usize)>> = BTreeMap::new();
    for row in rows {
        coins.insert(row.coin.clone());
        if let Some(value) = usable(row.log_return_1h) {
            let cell = sums
                .entry(row.coin.clone())
                .or_default()
                .entry(row.timestamp_ms)
                .or_insert((0.0, 0));
            cell.0 += value;
            cell.1 += 1;
        }
    }
    let pivot = sums
        .into_iter()
        .map(|(coin, cells)| {
            let means = cells
                .into_iter()
                .map(|(ts, (sum, n))| (ts, sum / n as f64))
                .collect();
            (coin, means)
        })
        .collect();
    (coins, pivot)
}

/// Values of both coins at the timestamps where both have one.
fn paired_samples(a: &BTreeMap<i64, f64>, b: &BTreeMap<i64, f64>) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .filter_map(|(ts, x)| b.get(ts).map(|y| (*x, *y)))
        .unzip()
}

/// Correlation of log-returns over the inclusive window `[start_ms, end_ms]`.
///
/// Every coin with a row in the window gets a row/column. A pair with fewer than two
/// overlapping samples is NaN; the diagonal is 1.0 for any coin with at least two samples.
/// A window without rows, or without a single usable log-return, is `MissingData`.
pub fn correlation_matrix(
    dataset: &CombinedDataset,
    start_ms: i64,
    end_ms: i64,
) -> Result<CorrelationMatrix, MissingData> {
    let (coins, pivot) = pivot_log_returns(dataset.rows_in_window(start_ms, end_ms));
    if coins.is_empty() {
        return Err(MissingData::EmptyWindow { start_ms, end_ms });
    }
    if pivot.is_empty() {
        return Err(MissingData::NoReturnsInWindow { start_ms, end_ms });
    }

    let coins: Vec<String> = coins.into_iter().collect();
    let empty = BTreeMap::new();
    let series: Vec<&BTreeMap<i64, f64>> = coins
        .iter()
        .map(|coin| pivot.get(coin).unwrap_or(&empty))
        .collect();

    let n = coins.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for (i, s) in series.iter().enumerate() {
        if s.len() >= 2 {
            values[i][i] = 1.0;
        }
    }
    for (i, j) in (0..n).tuple_combinations() {
        let (xs, ys) = paired_samples(series[i], series[j]);
        let r = maths_utils::pearson(&xs, &ys);
        values[i][j] = r;
        values[j][i] = r;
    }

    Ok(CorrelationMatrix { coins, values })
}
