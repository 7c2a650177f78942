//! Demo Bank server
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│ Postgres │───▶│  Schema  │───▶│ Gateway  │
//! │  (YAML)  │    │  (pool)  │    │ (init)   │    │ (axum)   │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use demo_bank::config::AppConfig;
use demo_bank::db::{Database, init_schema};
use demo_bank::gateway::{self, state::AppState};
use demo_bank::logging::init_logging;
use demo_bank::store::PgStore;
use demo_bank::token::TokenMaker;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _log_guard = init_logging(&config);

    tracing::info!(env = %env, "Starting demo_bank");

    let token_maker = TokenMaker::new(&config.token_symmetric_key)
        .context("Cannot create token maker")?;

    let db = Database::connect(&config.postgres_url)
        .await
        .context("Cannot connect to PostgreSQL")?;
    db.health_check().await.context("PostgreSQL health check failed")?;
    init_schema(db.pool()).await.context("Cannot initialize schema")?;

    let store = Arc::new(PgStore::new(db.into_pool()));
    let state = AppState::new(store, Arc::new(token_maker), config.access_token_duration())
        .with_transfer_timeout(config.transfer_timeout());

    if let Some(timeout) = config.transfer_timeout() {
        tracing::info!(timeout_ms = timeout.as_millis() as u64, "Transfer deadline enabled");
    }

    gateway::run_server(&config.gateway, Arc::new(state)).await
}
