use crate::core::snapshot::CacheEntry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Latest snapshot per currency code. Last writer wins.
///
/// Readers share the lock; a `put` replaces the whole entry under the write lock, so a
/// reader sees either the previous entry or the new one.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<HashMap<String, CacheEntry>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, code: &str) -> Option<CacheEntry> {
        let cache = self.inner.read().await;
        let entry = cache.get(code).cloned();
        if entry.is_some() {
            debug!(currency = code, "Cache HIT");
        } else {
            debug!(currency = code, "Cache MISS");
        }
        entry
    }

    pub async fn put(&self, entry: CacheEntry) {
        let mut cache = self.inner.write().await;
        debug!(currency = %entry.currency_code, "Cache PUT");
        cache.insert(entry.currency_code.clone(), entry);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
