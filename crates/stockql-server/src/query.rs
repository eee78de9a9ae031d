//! Query pipeline: interpret, compile, execute

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stockql_compile::to_sql;
use stockql_duck::{execute, Connection, Execution, ExecutionError, Storage, StorageError};
use stockql_ir::{QueryIr, Record};
use thiserror::Error;
use tokio::time::timeout;

use crate::config::Config;
use crate::llm::{InterpretError, Interpreter};
use crate::log_event;

const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking executor run on the per-request session
type ExecuteFn = fn(&QueryIr, &Connection) -> Result<Execution, ExecutionError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("Query task failed: {0}")]
    Join(String),
}

impl QueryError {
    /// Short label used for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            QueryError::InvalidInput(_) => "invalid_input",
            QueryError::Interpret(InterpretError::Interpretation(_)) => "interpretation_error",
            QueryError::Interpret(InterpretError::Upstream(_)) => "upstream_error",
            QueryError::Execution(_) | QueryError::Storage(_) | QueryError::Join(_) => {
                "execution_error"
            }
            QueryError::Timeout(_) => "timeout",
        }
    }
}

/// Everything the caller sees for one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub parsed_json: QueryIr,
    pub sql_query: String,
    pub results: Vec<Record>,
    pub execution_time: f64,
}

pub struct QueryService {
    interpreter: Interpreter,
    storage: Arc<Storage>,
    llm_timeout: Duration,
    query_timeout: Duration,
    execute: ExecuteFn,
}

impl QueryService {
    pub fn new(interpreter: Interpreter, storage: Arc<Storage>) -> Self {
        Self {
            interpreter,
            storage,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            execute,
        }
    }

    pub fn with_timeouts(mut self, llm_timeout: Duration, query_timeout: Duration) -> Self {
        self.llm_timeout = llm_timeout;
        self.query_timeout = query_timeout;
        self
    }

    /// Timeouts taken from `llm.timeout_secs` and `storage.query_timeout_secs`
    pub fn with_config(self, config: &Config) -> Self {
        self.with_timeouts(
            Duration::from_secs(config.llm.timeout_secs),
            Duration::from_secs(config.storage.query_timeout_secs),
        )
    }

    /// Run one natural-language query end to end
    pub async fn run(&self, text: &str) -> Result<QueryResponse, QueryError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QueryError::InvalidInput("query must not be empty".to_string()));
        }

        let ir = timeout(self.llm_timeout, self.interpreter.interpret(text))
            .await
            .map_err(|_| QueryError::Timeout("Query interpretation"))??;

        let fingerprint = ir.fingerprint();
        let sql = to_sql(&ir);
        tracing::debug!(fingerprint = %fingerprint, sql = %sql, "query compiled");

        // Per-request session; the shared handle is only locked while cloning
        let conn = self.storage.session()?;
        let task_ir = ir.clone();
        let execute = self.execute;
        let task = tokio::task::spawn_blocking(move || execute(&task_ir, &conn));

        // On timeout the blocking task runs to completion and its result is dropped
        let execution = timeout(self.query_timeout, task)
            .await
            .map_err(|_| QueryError::Timeout("Query execution"))?
            .map_err(|e| QueryError::Join(e.to_string()))??;

        log_event!(
            level: tracing::Level::INFO,
            event: "query_executed",
            fingerprint: fingerprint,
            sql: sql,
            filters: ir.filters.len(),
            rows: execution.records.len(),
            duration_secs: execution.elapsed_secs
        );

        Ok(QueryResponse {
            parsed_json: ir,
            sql_query: sql,
            results: execution.records,
            execution_time: execution.elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionService;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    struct Fixed(&'static str);

    #[async_trait]
    impl CompletionService for Fixed {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, InterpretError> {
            Ok(self.0.to_string())
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionService for Stalled {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, InterpretError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".to_string())
        }
    }

    fn storage() -> Arc<Storage> {
        let storage = Storage::open_in_memory().unwrap();
        storage.init_schema().unwrap();
        storage
            .insert_records(&[
                Record::new("HIGH", "High Priced Co", 150.0).with_sector("Technology"),
                Record::new("LOW", "Low Priced Co", 50.0).with_sector("Energy"),
            ])
            .unwrap();
        Arc::new(storage)
    }

    fn service(reply: &'static str) -> QueryService {
        QueryService::new(Interpreter::new(Arc::new(Fixed(reply))), storage())
    }

    #[tokio::test]
    async fn test_run_price_filter() {
        let service =
            service(r#"{"filters": [{"field": "price", "operator": "gt", "value": 100}]}"#);

        let response = service.run("stocks above $100").await.unwrap();

        assert_eq!(response.sql_query, "SELECT * FROM stocks WHERE price > 100 LIMIT 100");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].symbol, "HIGH");
        assert_eq!(response.parsed_json.limit, 100);
        assert!(response.execution_time >= 0.0);
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_interpretation() {
        let err = service("{}").run("   ").await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput(_)));
        assert_eq!(err.outcome(), "invalid_input");
    }

    #[tokio::test]
    async fn test_interpretation_error_surfaces() {
        let err = service("not json").run("tech stocks").await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Interpret(InterpretError::Interpretation(_))
        ));
    }

    #[tokio::test]
    async fn test_execution_error_when_table_missing() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        let service = QueryService::new(Interpreter::new(Arc::new(Fixed("{}"))), storage);

        let err = service.run("everything").await.unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
        assert_eq!(err.outcome(), "execution_error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interpretation_timeout() {
        let service = QueryService::new(Interpreter::new(Arc::new(Stalled)), storage())
            .with_timeouts(Duration::from_millis(50), Duration::from_secs(1));

        let err = service.run("anything").await.unwrap_err();
        assert!(matches!(err, QueryError::Timeout(_)));
    }

    fn slow_execute(ir: &QueryIr, conn: &Connection) -> Result<Execution, ExecutionError> {
        std::thread::sleep(Duration::from_millis(500));
        execute(ir, conn)
    }

    #[tokio::test]
    async fn test_query_execution_timeout() {
        let mut service = service("{}")
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(20));
        service.execute = slow_execute;

        let err = service.run("everything").await.unwrap_err();
        assert!(matches!(err, QueryError::Timeout("Query execution")));
        assert_eq!(err.outcome(), "timeout");
        assert_eq!(err.to_string(), "Query execution timed out");
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
