//! CoinGecko `market_chart` endpoint.
//!
//! Endpoint: `{base}/coins/{id}/market_chart?vs_currency={vs}&days={days}`
//! Returns: `{"prices": [[ms, v], ...], "market_caps": [...], "total_volumes": [...]}`

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{COINGECKO, ChartRequest};
use crate::data::market_chart::{
    ChartCollection, ChartFetchError, CreateChartCollection, MarketChart, MarketChartFetcher,
    fetch_multiple_coins, parse_market_chart,
};

pub struct CoinGeckoApi {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoApi {
    pub fn new() -> Result<Self> {
        Self::with_base_url(COINGECKO.base_url)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(COINGECKO.client.timeout_ms))
            .user_agent(COINGECKO.client.user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn market_chart_url(&self, coin: &str) -> String {
        format!("{}/coins/{}/market_chart", self.base_url, coin)
    }
}

#[async_trait]
impl MarketChartFetcher for CoinGeckoApi {
    async fn fetch_market_chart(
        &self,
        coin: &str,
        request: &ChartRequest,
    ) -> Result<MarketChart, ChartFetchError> {
        let days = request.days.to_string();
        let response = self
            .client
            .get(self.market_chart_url(coin))
            .query(&[("vs_currency", request.vs_currency.as_str()), ("days", days.as_str())])
            .send()
            .await
            .map_err(|e| ChartFetchError::Http {
                coin: coin.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ChartFetchError::Status {
                coin: coin.to_string(),
                status: response.status().as_u16(),
            });
        }

        let doc: serde_json::Value =
            response.json().await.map_err(|e| ChartFetchError::Decode {
                coin: coin.to_string(),
                reason: e.to_string(),
            })?;

        let (chart, report) = parse_market_chart(&doc);
        if !report.is_clean() {
            log::warn!(
                "{}: {} non-numeric values coerced to NaN, {} entries without timestamp skipped",
                coin,
                report.coerced_values,
                report.skipped_entries
            );
        }
        Ok(chart)
    }
}

#[async_trait]
impl CreateChartCollection for CoinGeckoApi {
    fn signature(&self) -> &'static str {
        "CoinGecko API"
    }

    async fn create_chart_collection(
        &self,
        coins: &[String],
        request: &ChartRequest,
    ) -> Result<ChartCollection> {
        let collection = fetch_multiple_coins(self, coins, request).await;
        if collection.charts.is_empty() {
            bail!("No coin could be fetched from {}", self.base_url);
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_market_chart_url_without_double_slash() {
        let api = CoinGeckoApi::with_base_url("https://example.test/api/v3/").unwrap();
        assert_eq!(
            api.market_chart_url("bitcoin"),
            "https://example.test/api/v3/coins/bitcoin/market_chart"
        );
    }
}
