//! HTTP quote provider
//!
//! Fetches one JSON quote document per symbol. The document uses Yahoo
//! Finance `info` keys (`longName`, `sector`, `currentPrice`, ...), so any
//! endpoint serving that shape works, e.g. a small yfinance sidecar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use stockql_ir::Record;

use crate::provider::{MarketDataProvider, ProviderError};

/// Placeholder substituted with the ticker in a quote URL template
pub const SYMBOL_PLACEHOLDER: &str = "{symbol}";

const UNKNOWN: &str = "Unknown";

/// Quote document as served by the endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInfo {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<i64>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl QuoteInfo {
    /// Price falls back from current to regular-market to previous close
    pub fn into_record(self, symbol: &str) -> Record {
        let price = self
            .current_price
            .or(self.regular_market_price)
            .or(self.previous_close)
            .unwrap_or(0.0);

        Record {
            symbol: symbol.to_string(),
            company_name: self.long_name.unwrap_or_else(|| UNKNOWN.to_string()),
            sector: Some(self.sector.unwrap_or_else(|| UNKNOWN.to_string())),
            industry: Some(self.industry.unwrap_or_else(|| UNKNOWN.to_string())),
            price,
            market_cap: Some(self.market_cap.unwrap_or(0.0)),
            volume: Some(self.volume.unwrap_or(0)),
            pe_ratio: self.trailing_pe,
            dividend_yield: self.dividend_yield,
            created_at: None,
        }
    }
}

pub struct QuoteApiProvider {
    client: Client,
    url_template: String,
}

impl QuoteApiProvider {
    /// `url_template` must contain `{symbol}`
    pub fn new(url_template: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }

    fn url_for(&self, symbol: &str) -> String {
        self.url_template.replace(SYMBOL_PLACEHOLDER, symbol)
    }

    async fn fetch_one(&self, symbol: &str) -> Result<Record, ProviderError> {
        let info: QuoteInfo = self
            .client
            .get(self.url_for(symbol))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(info.into_record(symbol))
    }
}

#[async_trait]
impl MarketDataProvider for QuoteApiProvider {
    async fn fetch(&self, symbols: &[&str]) -> Result<Vec<Record>, ProviderError> {
        let mut fetched = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.fetch_one(symbol).await {
                Ok(record) => {
                    tracing::debug!(symbol = *symbol, price = record.price, "fetched quote");
                    fetched.push(record);
                }
                Err(e) => tracing::warn!(symbol = *symbol, error = %e, "quote fetch failed, skipping"),
            }
        }
        Ok(fetched)
    }
}
