use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use sheet_translations::{
    auth::ServiceAccountAuth,
    cache::InMemoryStore,
    config::{self, Config},
    server::{self, AppState},
    sheets::GoogleSheetsClient,
    translations::TranslationService,
};

/// How often expired cache entries are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sheet_translations=info".parse()?),
        )
        .init();

    info!("Starting sheet translations service");

    // Load configuration from environment
    let config = Config::from_env().inspect_err(|e| {
        error!("Invalid configuration, refusing to start: {:#}", e);
    })?;

    let http = config::http_client(config::REQUEST_TIMEOUT)?;
    let auth = ServiceAccountAuth::from_config(&config, http.clone())
        .context("Failed to initialize Google service account auth")?;
    let client = GoogleSheetsClient::from_config(&config, http, Arc::new(auth))?;

    let store = Arc::new(InMemoryStore::new());
    spawn_purge_task(Arc::clone(&store));

    let state = AppState {
        translations: Arc::new(TranslationService::new(Arc::new(client), store)),
    };
    let app = server::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_purge_task(store: Arc<InMemoryStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            store.purge_expired();
        }
    });
}
