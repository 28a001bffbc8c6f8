//! taskpet backend server.
//!
//! Syncs completed tasks from a Notion database into a per-user points
//! ledger and exposes the accessory shop over HTTP.

mod config;
mod routes;

use std::sync::Arc;

use notion::Notion;
use taskpet_core::{
    AccountService, JsonFileStore, NotionTaskSource, ServiceConfig, DEFAULT_CATALOG,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let api_key_configured = config.api_key.is_some();
    let database_configured = config.database_id.is_some();
    if !api_key_configured {
        warn!("NOTION_API_KEY is not set; syncs will serve cached state only");
    }
    if !database_configured {
        warn!("NOTION_DATABASE_ID is not set; syncs will serve cached state only");
    }

    let client = Notion::new(config.api_key.clone().unwrap_or_default());
    let source = NotionTaskSource::new(
        client,
        config.database_id.clone().unwrap_or_default(),
        config.rules.clone(),
    );

    let service = Arc::new(AccountService::new(
        Arc::new(JsonFileStore::new(&config.data_file)),
        Arc::new(source),
        Arc::new(DEFAULT_CATALOG.clone()),
        ServiceConfig {
            points_per_task: config.points_per_task,
            seed: config.seed.clone(),
        },
    ));

    let app = routes::router(AppState {
        service,
        api_key_configured,
        database_configured,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(%addr, data_file = %config.data_file, "taskpet backend listening");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
