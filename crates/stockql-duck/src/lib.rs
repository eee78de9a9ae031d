//! DuckDB backend for stockql
//!
//! - [`render_native`]: compiled conditions to a parameterized [`BoundQuery`]
//! - [`execute`]: runs it and materializes [`stockql_ir::Record`]s
//! - [`Storage`]: schema, bulk insert and seeding from a [`MarketDataProvider`]
//!   ([`FixtureProvider`] offline, [`QuoteApiProvider`] over HTTP)

pub mod builder;
pub mod executor;
pub mod provider;
pub mod quote;
pub mod render;
pub mod storage;

pub use builder::{BoundQuery, SelectBuilder};
pub use duckdb::Connection;
pub use executor::{execute, Execution, ExecutionError};
pub use provider::{FixtureProvider, MarketDataProvider, ProviderError, DEFAULT_SYMBOLS};
pub use quote::{QuoteApiProvider, QuoteInfo};
pub use render::{render_native, RECORD_COLUMNS};
pub use storage::{Storage, StorageError};
