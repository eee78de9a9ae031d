//! Storage bootstrap: database handle, schema and bulk population
//!
//! Not part of the live query path. Queries get their own connection through
//! [`Storage::session`].

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use duckdb::{params, Connection};
use stockql_ir::{Record, STOCKS_TABLE};
use thiserror::Error;

use crate::provider::{MarketDataProvider, ProviderError};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Market data provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database handle poisoned by a panicked writer")]
    Poisoned,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stocks (
    symbol VARCHAR PRIMARY KEY CHECK (symbol <> ''),
    company_name VARCHAR NOT NULL,
    sector VARCHAR,
    industry VARCHAR,
    price DOUBLE NOT NULL,
    market_cap DOUBLE,
    volume BIGINT,
    pe_ratio DOUBLE,
    dividend_yield DOUBLE,
    created_at TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_stocks_sector ON stocks (sector);
CREATE INDEX IF NOT EXISTS idx_stocks_market_cap ON stocks (market_cap);
CREATE INDEX IF NOT EXISTS idx_stocks_volume ON stocks (volume);
";

const INSERT: &str = "INSERT INTO stocks (symbol, company_name, sector, industry, price, \
     market_cap, volume, pe_ratio, dividend_yield, created_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Shared database; hands out per-request connections
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Create the stocks table and its indexes if they are missing
    pub fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(table = STOCKS_TABLE, "schema ready");
        Ok(())
    }

    /// A connection of its own for one request
    pub fn session(&self) -> Result<Connection, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(conn.try_clone()?)
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", STOCKS_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Insert all records in one transaction; nothing is written if any fails
    pub fn insert_records(&self, records: &[Record]) -> Result<usize, StorageError> {
        if let Some(bad) = records.iter().find(|r| r.symbol.trim().is_empty()) {
            return Err(StorageError::InvalidRecord(format!(
                "empty symbol for company '{}'",
                bad.company_name
            )));
        }

        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT)?;
            let now = Utc::now().naive_utc();
            for record in records {
                stmt.execute(params![
                    record.symbol,
                    record.company_name,
                    record.sector,
                    record.industry,
                    record.price,
                    record.market_cap,
                    record.volume,
                    record.pe_ratio,
                    record.dividend_yield,
                    record.created_at.unwrap_or(now),
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(rows = records.len(), "inserted stock records");
        Ok(records.len())
    }

    /// Populate an empty table from `provider`; returns how many rows were added
    pub async fn seed_if_empty(
        &self,
        provider: &dyn MarketDataProvider,
        symbols: &[&str],
    ) -> Result<usize, StorageError> {
        let existing = self.count()?;
        if existing > 0 {
            tracing::info!(existing, "stocks table already populated, skipping seed");
            return Ok(0);
        }

        let records = provider.fetch(symbols).await?;
        tracing::info!(
            requested = symbols.len(),
            fetched = records.len(),
            "seeding stocks table"
        );
        self.insert_records(&records)
    }
}
