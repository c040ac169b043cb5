//! salesql HTTP server
//!
//! Accepts natural language questions about the sales table, asks a
//! completion service for one SQLite SELECT statement, and runs it against a
//! read-only store.

use std::sync::Arc;

use salesql_schema::SALES;
use salesql_store::SqliteExecutor;
use tracing::{info, warn};

mod api;
mod config;
mod llm;
mod logging;
mod query;

use config::Config;
use llm::OpenAiGenerator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Secrets first so config overrides can see them
    dotenvy::dotenv().ok();

    let config_path = std::env::var("SALESQL_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load_or_default(&config_path)?;

    logging::init(&config.logging);
    info!(config = %config_path, "Configuration loaded");

    let api_key = config.api_key()?;
    let generator = OpenAiGenerator::new(&config.llm, api_key);
    info!(
        model = %generator.model(),
        api_base = config.llm.api_base.as_deref().unwrap_or("default"),
        "Completion service configured"
    );

    if !config.database.path.exists() {
        warn!(
            path = %config.database.path.display(),
            "Store not found; queries will fail until it exists"
        );
    }
    let executor = SqliteExecutor::new(config.database.path.clone(), &SALES);

    let state = api::AppState::new(Arc::new(generator), executor);
    api::serve(&config.server.addr(), state).await
}
