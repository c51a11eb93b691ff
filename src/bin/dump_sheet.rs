//! Dump translations for one language straight from the document, bypassing the cache.
//!
//! Usage:
//!   cargo run --bin dump-sheet -- <lang> [namespace]
//!
//! Reads the same environment variables as the server.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;
use sheet_translations::{
    auth::ServiceAccountAuth,
    cache::InMemoryStore,
    config::{self, Config},
    sheets::GoogleSheetsClient,
    translations::{TranslationService, DEFAULT_NAMESPACE},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sheet_translations=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(lang) = args.next() else {
        bail!("Usage: dump-sheet <lang> [namespace]");
    };
    let namespace = args.next().unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    let config = Config::from_env()?;
    let http = config::http_client(config::REQUEST_TIMEOUT)?;
    let auth = ServiceAccountAuth::from_config(&config, http.clone())?;
    let client = GoogleSheetsClient::from_config(&config, http, Arc::new(auth))?;
    let service = TranslationService::new(Arc::new(client), Arc::new(InMemoryStore::new()));

    let translations = service
        .get_translations(&lang, &namespace)
        .await
        .with_context(|| format!("No translations for {} in '{}' (see log above)", lang, namespace))?;

    info!("✓ {} translations for {} in '{}'", translations.len(), lang, namespace);
    println!("{}", serde_json::to_string_pretty(translations.as_ref())?);

    Ok(())
}
