//! Market data providers used to populate the catalog at bootstrap

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use stockql_ir::Record;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to read market data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse market data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Market data request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Large-cap tickers loaded into a fresh database
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "BRK-B", "TSM", "UNH",
    "JNJ", "JPM", "V", "XOM", "LLY", "WMT", "PG", "MA", "AVGO", "HD",
    "CVX", "MRK", "KO", "PEP", "ABBV", "COST", "ADBE", "CSCO", "MCD", "TMO",
    "CRM", "PFE", "ACN", "CMCSA", "LIN", "AMD", "NFLX", "DHR", "ABT", "ORCL",
    "NKE", "TXN", "DIS", "PM", "WFC", "UPS", "BMY", "NEE", "QCOM", "UNP",
    "RTX", "HON", "MS", "BA", "INTC", "IBM", "LOW", "AMGN", "CAT", "SPGI",
    "GE", "INTU", "DE", "PLD", "SBUX", "GS", "COP", "BLK", "MDLZ", "MDT",
    "LMT", "T", "ISRG", "TJX", "ADP", "BKNG", "GILD", "MMC", "VRTX", "ADI",
    "C", "SYK", "AMT", "ELV", "CI", "AXP", "CB", "REGN", "LRCX",
    "PYPL", "BSX", "ZTS", "BDX", "ETN", "SLB", "FI", "EOG", "CME", "MU",
];

/// Source of stock records.
///
/// Symbols a provider cannot resolve are skipped, not reported as errors.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, symbols: &[&str]) -> Result<Vec<Record>, ProviderError>;
}

/// Records from a JSON array on disk, keyed by symbol
pub struct FixtureProvider {
    records: HashMap<String, Record>,
}

impl FixtureProvider {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ProviderError> {
        let records: Vec<Record> = serde_json::from_str(contents)?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.symbol.clone(), r))
                .collect(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FixtureProvider {
    async fn fetch(&self, symbols: &[&str]) -> Result<Vec<Record>, ProviderError> {
        let mut fetched = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.records.get(*symbol) {
                Some(record) => fetched.push(record.clone()),
                None => tracing::warn!(symbol = *symbol, "no market data for symbol, skipping"),
            }
        }
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"symbol": "AAPL", "company_name": "Apple Inc.", "sector": "Technology", "price": 190.0},
        {"symbol": "XOM", "company_name": "Exxon Mobil", "sector": "Energy", "price": 110.0}
    ]"#;

    #[tokio::test]
    async fn test_unknown_symbols_skipped() {
        let provider = FixtureProvider::from_json(FIXTURE).unwrap();
        let records = provider.fetch(&["XOM", "ZZZZ", "AAPL"]).await.unwrap();

        let symbols: Vec<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["XOM", "AAPL"]);
    }

    #[test]
    fn test_malformed_fixture() {
        assert!(matches!(
            FixtureProvider::from_json("{not json"),
            Err(ProviderError::Json(_))
        ));
    }

    #[test]
    fn test_default_symbols_unique() {
        let unique: std::collections::HashSet<_> = DEFAULT_SYMBOLS.iter().collect();
        assert_eq!(unique.len(), DEFAULT_SYMBOLS.len());
    }
}
