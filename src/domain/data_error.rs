use std::fmt;

use crate::utils::time_utils::epoch_ms_to_utc;

/// "No data" outcomes. These are soft: callers render an explicit empty state
/// instead of treating them as zero-valued data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingData {
    /// All three raw sequences of a coin were empty.
    EmptyRawSeries { coin: String },
    /// The dataset holds no rows at all for this coin.
    UnknownCoin { coin: String },
    /// No rows fall inside the inclusive window.
    EmptyWindow { start_ms: i64, end_ms: i64 },
    /// Rows exist in the window but none carries a usable log-return.
    NoReturnsInWindow { start_ms: i64, end_ms: i64 },
}

impl std::error::Error for MissingData {}
impl fmt::Display for MissingData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MissingData::EmptyRawSeries { coin } => {
                write!(f, "{}: raw market chart has no observations", coin)
            }
            MissingData::UnknownCoin { coin } => write!(f, "no data stored for {}", coin),
            MissingData::EmptyWindow { start_ms, end_ms } => write!(
                f,
                "no data between {} and {}",
                epoch_ms_to_utc(*start_ms),
                epoch_ms_to_utc(*end_ms)
            ),
            MissingData::NoReturnsInWindow { start_ms, end_ms } => write!(
                f,
                "insufficient data: no log returns between {} and {}",
                epoch_ms_to_utc(*start_ms),
                epoch_ms_to_utc(*end_ms)
            ),
        }
    }
}
