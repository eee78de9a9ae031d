//! HTTP boundary
//!
//! Endpoints:
//! - POST /api/query   - natural-language query -> `{parsed_json, sql_query, results, execution_time}`
//! - GET  /api/health  - liveness
//! - GET  /            - service info
//! - GET  /metrics     - Prometheus text

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::llm::InterpretError;
use crate::metrics::Metrics;
use crate::query::{QueryError, QueryResponse, QueryService};

pub struct AppState {
    pub service: QueryService,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(service: QueryService, metrics: Metrics) -> Self {
        Self { service, metrics }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/query", post(query_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Stock screening query API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/health",
        "query": "/api/query",
        "metrics": "/metrics",
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "message": "API is running",
    }))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.export() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, QueryError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("query", request_id = %request_id);

    async move {
        let started = Instant::now();

        let result = match payload {
            Ok(Json(request)) => {
                tracing::info!(query = %request.query, "query received");
                state.service.run(&request.query).await
            }
            Err(rejection) => Err(QueryError::InvalidInput(rejection.body_text())),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        state
            .metrics
            .record(outcome, started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(outcome, error = %e, "query failed");
        }

        result.map(Json)
    }
    .instrument(span)
    .await
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            QueryError::InvalidInput(_)
            | QueryError::Interpret(InterpretError::Interpretation(_)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid query: {}", self))
            }
            QueryError::Interpret(InterpretError::Upstream(_)) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            QueryError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            QueryError::Execution(_) | QueryError::Storage(_) | QueryError::Join(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Execution error: {}", self),
            ),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
