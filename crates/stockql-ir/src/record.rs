//! Stock records as stored and returned to callers

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One equity in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub symbol: String,
    pub company_name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    /// Assigned by storage on insert; serialized as ISO-8601
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Record {
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
            sector: None,
            industry: None,
            price,
            market_cap: None,
            volume: None,
            pe_ratio: None,
            dividend_yield: None,
            created_at: None,
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_pe_ratio(mut self, pe_ratio: f64) -> Self {
        self.pe_ratio = Some(pe_ratio);
        self
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_created_at_serializes_iso8601() {
        let mut record = Record::new("AAPL", "Apple Inc.", 190.5).with_sector("Technology");
        record.created_at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["created_at"], "2024-03-01T12:30:00");
        assert_eq!(json["industry"], serde_json::Value::Null);
    }

    #[test]
    fn test_fixture_shape_deserializes_with_defaults() {
        let record: Record = serde_json::from_str(
            r#"{"symbol": "XOM", "company_name": "Exxon Mobil", "price": 110.2, "sector": "Energy"}"#,
        )
        .unwrap();

        assert_eq!(record.sector.as_deref(), Some("Energy"));
        assert!(record.market_cap.is_none());
        assert!(record.created_at.is_none());
    }
}
