use std::collections::BTreeSet;

use crate::models::{DerivedRow, StoredRow};

/// Derived rows of many coins in one flat dataset.
/// Every row carries the full column set, so a coin without e.g. market caps
/// simply holds `None` in that column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedDataset {
    pub rows: Vec<DerivedRow>,
}

/// Concatenate per-coin frames in the order given. Nothing is dropped.
pub fn combine_coin_frames<I>(frames: I) -> CombinedDataset
where
    I: IntoIterator<Item = Vec<DerivedRow>>,
{
    CombinedDataset {
        rows: frames.into_iter().flatten().collect(),
    }
}

impl CombinedDataset {
    /// Build from store rows, dropping any row without a coin identifier.
    pub fn from_stored(stored: &[StoredRow]) -> Self {
        let rows: Vec<DerivedRow> = stored
            .iter()
            .filter(|s| !s.row.coin.trim().is_empty())
            .map(|s| s.row.clone())
            .collect();
        let dropped = stored.len() - rows.len();
        if dropped > 0 {
            log::warn!("Dropped {} stored rows without a coin identifier", dropped);
        }
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sorted unique coin identifiers.
    pub fn coins(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.coin.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// "bitcoin" when present, else the first coin alphabetically.
    pub fn default_coin(&self) -> Option<String> {
        let coins = self.coins();
        if coins.iter().any(|c| c == "bitcoin") {
            return Some("bitcoin".to_string());
        }
        coins.into_iter().next()
    }

    /// First and last timestamp in the dataset.
    pub fn time_span_ms(&self) -> Option<(i64, i64)> {
        let min = self.rows.iter().map(|r| r.timestamp_ms).min()?;
        let max = self.rows.iter().map(|r| r.timestamp_ms).max()?;
        Some((min, max))
    }

    pub fn rows_in_window(&self, start_ms: i64, end_ms: i64) -> impl Iterator<Item = &DerivedRow> {
        self.rows.iter().filter(move |r| r.in_window(start_ms, end_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(coin: &str, ts: i64, cap: Option<f64>) -> DerivedRow {
        DerivedRow {
            coin: coin.to_string(),
            timestamp_ms: ts,
            price: Some(1.0),
            market_cap: cap,
            total_volume: None,
            return_1h: None,
            log_return_1h: None,
            ma_24h: Some(1.0),
            volatility_24h: None,
            momentum_24h: Some(0.0),
        }
    }

    #[test]
    fn combine_preserves_rows_and_missing_columns() {
        let combined = combine_coin_frames(vec![
            vec![row("solana", 0, Some(1.0)), row("solana", 1, Some(2.0))],
            vec![row("bitcoin", 0, None)],
        ]);
        assert_eq!(combined.len(), 3);
        assert_eq!(combined.rows[2].market_cap, None);
        assert_eq!(combined.coins(), vec!["bitcoin", "solana"]);
        assert_eq!(combined.default_coin().as_deref(), Some("bitcoin"));
        assert_eq!(combined.time_span_ms(), Some((0, 1)));
    }

    #[test]
    fn stored_rows_without_coin_are_dropped() {
        let stored = vec![
            StoredRow {
                row: row("", 0, None),
                ingested_at_ms: 0,
            },
            StoredRow {
                row: row("cardano", 0, None),
                ingested_at_ms: 0,
            },
        ];
        let combined = CombinedDataset::from_stored(&stored);
        assert_eq!(combined.coins(), vec!["cardano"]);
        assert_eq!(combined.default_coin().as_deref(), Some("cardano"));
    }
}
