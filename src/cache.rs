//! Expiring store for translation maps.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Translation key → localized string for one `(namespace, language)` pair.
pub type TranslationMap = BTreeMap<String, String>;

/// Key/value store with per-entry expiration.
///
/// A `set` on an existing key replaces the previous entry and its expiration.
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Live entry for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<Arc<TranslationMap>>;

    async fn set(&self, key: &str, value: Arc<TranslationMap>, ttl: Duration);
}

struct CacheEntry {
    value: Arc<TranslationMap>,
    expires_at: Instant,
}

/// Process-local store backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TranslationStore for InMemoryStore {
    async fn get(&self, key: &str) -> Option<Arc<TranslationMap>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(Arc::clone(&entry.value));
            }
            // Release the shard lock before removing
            drop(entry);
            self.entries
                .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        }
        None
    }

    async fn set(&self, key: &str, value: Arc<TranslationMap>, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }
}
