//! stockql HTTP server
//!
//! Loads config.yaml (or `STOCKQL_CONFIG`), seeds the stock table when it is
//! empty and serves the query API.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use stockql_duck::{FixtureProvider, MarketDataProvider, QuoteApiProvider, Storage, DEFAULT_SYMBOLS};
use stockql_server::{
    api::{self, AppState},
    config::{Config, SeedProvider, StorageConfig},
    llm::Interpreter,
    logging,
    metrics::Metrics,
    query::QueryService,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config_path = std::env::var("STOCKQL_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    logging::init(&config.logging);
    info!(config = %config_path, "configuration loaded");

    let interpreter = Interpreter::from_config(&config.llm)?;
    let storage = Arc::new(open_storage(&config.storage).await?);

    let service = QueryService::new(interpreter, storage).with_config(&config);
    let metrics = Metrics::new().context("registering metrics")?;
    let state = Arc::new(AppState::new(service, metrics));
    let app = api::router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!(addr = %addr, "stockql server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the database, create the schema and seed an empty table
async fn open_storage(config: &StorageConfig) -> anyhow::Result<Storage> {
    let storage = if config.is_in_memory() {
        Storage::open_in_memory()?
    } else {
        if let Some(parent) = Path::new(&config.database).parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        Storage::open(&config.database)?
    };
    storage.init_schema()?;
    info!(database = %config.database, "storage ready");

    // A failed seed leaves an empty but usable table
    match seed_provider(config) {
        Ok(Some(provider)) => match storage.seed_if_empty(provider.as_ref(), DEFAULT_SYMBOLS).await {
            Ok(rows) => info!(rows, provider = ?config.provider, "seed complete"),
            Err(e) => warn!(error = %e, provider = ?config.provider, "seeding failed"),
        },
        Ok(None) => info!("no seed source configured"),
        Err(e) => warn!(error = %e, provider = ?config.provider, "seed provider unavailable"),
    }

    Ok(storage)
}

fn seed_provider(config: &StorageConfig) -> anyhow::Result<Option<Box<dyn MarketDataProvider>>> {
    let provider: Box<dyn MarketDataProvider> = match config.provider {
        SeedProvider::Fixture => match &config.seed_file {
            Some(seed_file) => Box::new(
                FixtureProvider::from_path(seed_file)
                    .with_context(|| format!("reading {}", seed_file))?,
            ),
            None => return Ok(None),
        },
        SeedProvider::QuoteApi => match &config.quote_url {
            Some(url) => Box::new(QuoteApiProvider::new(url, config.fetch_timeout_secs)?),
            None => return Ok(None),
        },
    };
    Ok(Some(provider))
}
