use serde::{Deserialize, Serialize};

use crate::utils::TimeUtils;

/// A coin identifier together with the grid frequency its series is resampled to.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct CoinInterval {
    pub coin: String,
    pub interval_ms: i64,
}

impl CoinInterval {
    pub fn new(coin: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            coin: coin.into(),
            interval_ms,
        }
    }
}

impl std::fmt::Display for CoinInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} @ {}",
            self.coin,
            TimeUtils::interval_ms_to_string(self.interval_ms)
        )
    }
}
