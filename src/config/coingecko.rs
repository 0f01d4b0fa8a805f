//! CoinGecko-specific configuration constants and types.

use std::time::Duration;

/// Default values for the REST client
pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub user_agent: &'static str,
}

/// The Master Configuration Struct
pub struct CoinGeckoConfig {
    pub base_url: &'static str,
    pub vs_currency: &'static str,
    /// History length requested per coin
    pub days: u32,
    /// Polite pause between successive coin fetches
    pub pause_ms: u64,
    pub client: ClientDefaults,
}

pub const COINGECKO: CoinGeckoConfig = CoinGeckoConfig {
    base_url: "https://api.coingecko.com/api/v3",
    vs_currency: "usd",
    days: 30,
    pause_ms: 1200,
    client: ClientDefaults {
        timeout_ms: 10_000,
        user_agent: "coin-grid/0.1",
    },
};

/// Parameters passed through to the retrieval collaborator unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub vs_currency: String,
    pub days: u32,
    pub pause: Duration,
}
