use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::cache::{TranslationMap, TranslationStore};
use crate::sheets::{DocumentClient, Sheet};

/// Namespace used when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "common";

/// How long a fetched map stays in the cache.
pub const TRANSLATION_TTL: Duration = Duration::from_secs(60 * 60);

/// Header of the column holding translation keys.
const KEY_COLUMN: &str = "key";

/// What the caller sees. Details are logged, never returned.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Failed to retrieve translations")]
    RetrievalFailed,
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("language column '{language}' not found in sheet '{namespace}'")]
    LanguageColumnNotFound { namespace: String, language: String },

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// Cache-backed lookup of translation maps.
pub struct TranslationService {
    client: Arc<dyn DocumentClient>,
    store: Arc<dyn TranslationStore>,
}

impl TranslationService {
    pub fn new(client: Arc<dyn DocumentClient>, store: Arc<dyn TranslationStore>) -> Self {
        Self { client, store }
    }

    /// Translations for `language` in `namespace`, from cache when live.
    ///
    /// Concurrent misses for the same pair each fetch and the last write wins.
    pub async fn get_translations(
        &self,
        language: &str,
        namespace: &str,
    ) -> Result<Arc<TranslationMap>, TranslationError> {
        let key = cache_key(namespace, language);

        if let Some(cached) = self.store.get(&key).await {
            info!("Cache hit for {}", key);
            return Ok(cached);
        }

        info!("Cache miss for {}, fetching from Google Sheets", key);

        match self.fetch(language, namespace).await {
            Ok(map) => {
                let map = Arc::new(map);
                self.store.set(&key, Arc::clone(&map), TRANSLATION_TTL).await;
                info!("Fetched {} translations for {}", map.len(), key);
                Ok(map)
            }
            Err(e) => {
                error!("Failed to fetch translations for {}: {:#}", key, e);
                Err(TranslationError::RetrievalFailed)
            }
        }
    }

    async fn fetch(&self, language: &str, namespace: &str) -> Result<TranslationMap, FetchError> {
        let metadata = self.client.load_metadata().await?;
        let properties = metadata
            .sheet_by_title(namespace)
            .ok_or_else(|| FetchError::SheetNotFound(namespace.to_string()))?;

        let sheet = self.client.load_sheet(&properties.title).await?;
        if !sheet.has_column(language) {
            return Err(FetchError::LanguageColumnNotFound {
                namespace: namespace.to_string(),
                language: language.to_string(),
            });
        }

        let map = rows_to_map(&sheet, language);
        debug!(
            "Mapped {} translations from sheet '{}' (id {})",
            map.len(),
            sheet.title(),
            properties.sheet_id
        );
        Ok(map)
    }
}

/// `translations:{namespace}:{language}` with `%` and `:` escaped in both
/// parts, so distinct pairs never share a key.
pub fn cache_key(namespace: &str, language: &str) -> String {
    format!(
        "translations:{}:{}",
        escape_key_part(namespace),
        escape_key_part(language)
    )
}

fn escape_key_part(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A")
}

/// Collect `key → value` for rows where both cells are non-empty.
pub fn rows_to_map(sheet: &Sheet, language: &str) -> TranslationMap {
    sheet
        .rows()
        .filter_map(|row| {
            let key = row.get(KEY_COLUMN).filter(|k| !k.is_empty())?;
            let value = row.get(language).filter(|v| !v.is_empty())?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
