use serde::{Deserialize, Serialize};

// ============================================================================
// Null vs NaN
// ----------------------------------------------------------------------------
// `None` means "nothing observed / not computable yet".
// `Some(f64::NAN)` means a numeric anomaly (coerced garbage, log of a
// non-positive number, division by a zero mean). Neither is ever zero.
// ============================================================================

/// One distinct timestamp of one coin after the outer join of the three raw sequences.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub coin: String,
    pub timestamp_ms: i64,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
}

/// One tick of the fixed-frequency grid.
/// `price` is forward-filled; `market_cap` / `total_volume` are only set where an
/// observation sat exactly on the tick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GridRow {
    pub coin: String,
    pub timestamp_ms: i64,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
}

impl GridRow {
    pub fn empty_tick(coin: &str, timestamp_ms: i64) -> Self {
        Self {
            coin: coin.to_string(),
            timestamp_ms,
            price: None,
            market_cap: None,
            total_volume: None,
        }
    }
}

impl From<&MergedRow> for GridRow {
    fn from(row: &MergedRow) -> Self {
        Self {
            coin: row.coin.clone(),
            timestamp_ms: row.timestamp_ms,
            price: row.price,
            market_cap: row.market_cap,
            total_volume: row.total_volume,
        }
    }
}

/// A grid tick with its derived analytics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub coin: String,
    pub timestamp_ms: i64,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub return_1h: Option<f64>,
    pub log_return_1h: Option<f64>,
    pub ma_24h: Option<f64>,
    pub volatility_24h: Option<f64>,
    pub momentum_24h: Option<f64>,
}

impl DerivedRow {
    pub fn in_window(&self, start_ms: i64, end_ms: i64) -> bool {
        self.timestamp_ms >= start_ms && self.timestamp_ms <= end_ms
    }
}

/// A derived row as read back from the store, with the time it was written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub row: DerivedRow,
    pub ingested_at_ms: i64,
}
