//! Prometheus metrics for the query endpoint

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,

    /// Queries by outcome (`ok`, `invalid_input`, `upstream_error`, ...)
    pub queries_total: IntCounterVec,

    /// Wall time of the whole pipeline, interpretation included
    pub query_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let queries_total = IntCounterVec::new(
            Opts::new("stockql_queries_total", "Total number of queries handled"),
            &["outcome"],
        )?;

        let query_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "stockql_query_duration_seconds",
                "End-to-end query latency in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(query_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            queries_total,
            query_duration_seconds,
        })
    }

    pub fn record(&self, outcome: &str, duration_secs: f64) {
        self.queries_total.with_label_values(&[outcome]).inc();
        self.query_duration_seconds.observe(duration_secs);
    }

    /// Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
