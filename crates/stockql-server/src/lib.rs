//! stockql server: natural-language stock screening over HTTP
//!
//! Pipeline: [`llm::Interpreter`] turns text into a `QueryIr`,
//! `stockql_compile` renders it, `stockql_duck` executes it, and
//! [`api::router`] exposes the whole thing.

pub mod api;
pub mod config;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod query;
