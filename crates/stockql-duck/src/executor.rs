//! Executor - runs the native plan and materializes records

use std::time::Instant;

use duckdb::{params_from_iter, Connection, Row};
use stockql_compile::CompiledQuery;
use stockql_ir::{QueryIr, Record};
use thiserror::Error;

use crate::builder::BoundQuery;
use crate::render::render_native;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Query execution failed: {0}")]
    Database(#[from] duckdb::Error),
}

/// Records matched by a query and the wall-clock time it took
#[derive(Debug, Clone)]
pub struct Execution {
    pub records: Vec<Record>,
    pub elapsed_secs: f64,
}

/// Compile, render with bound parameters and run `ir` on `conn`
pub fn execute(ir: &QueryIr, conn: &Connection) -> Result<Execution, ExecutionError> {
    let start = Instant::now();
    let query = render_native(&CompiledQuery::from_ir(ir));

    tracing::debug!(sql = %query.sql, params = query.params.len(), "executing native query");

    match run(&query, conn) {
        Ok(records) => {
            let elapsed_secs = start.elapsed().as_secs_f64();
            tracing::debug!(rows = records.len(), elapsed_secs, "query complete");
            Ok(Execution {
                records,
                elapsed_secs,
            })
        }
        Err(e) => {
            tracing::warn!(
                elapsed_secs = start.elapsed().as_secs_f64(),
                error = %e,
                "query failed"
            );
            Err(e)
        }
    }
}

fn run(query: &BoundQuery, conn: &Connection) -> Result<Vec<Record>, ExecutionError> {
    let mut stmt = conn.prepare(&query.sql)?;
    let rows = stmt.query_map(params_from_iter(query.params.iter()), record_from_row)?;
    let records = rows.collect::<duckdb::Result<Vec<_>>>()?;
    Ok(records)
}

/// Row laid out as [`crate::render::RECORD_COLUMNS`]
fn record_from_row(row: &Row<'_>) -> duckdb::Result<Record> {
    Ok(Record {
        symbol: row.get(0)?,
        company_name: row.get(1)?,
        sector: row.get(2)?,
        industry: row.get(3)?,
        price: row.get(4)?,
        market_cap: row.get(5)?,
        volume: row.get(6)?,
        pe_ratio: row.get(7)?,
        dividend_yield: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_is_execution_error() -> duckdb::Result<()> {
        let conn = Connection::open_in_memory()?;
        let err = execute(&QueryIr::new(), &conn).unwrap_err();
        assert!(matches!(err, ExecutionError::Database(_)));
        assert!(err.to_string().starts_with("Query execution failed"));
        Ok(())
    }
}
