use super::worker::CacheStorage;
use super::{CachedResponse, OfflineError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type NamedCache = (String, HashMap<String, CachedResponse>);

/// In-process cache storage. Caches keep their creation order.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<Vec<NamedCache>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn caches(&self) -> MutexGuard<'_, Vec<NamedCache>> {
        self.caches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn keys(&self) -> Result<Vec<String>, OfflineError> {
        Ok(self.caches().iter().map(|(name, _)| name.clone()).collect())
    }

    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError> {
        let mut caches = self.caches();
        let index = match caches.iter().position(|(name, _)| name == cache) {
            Some(index) => index,
            None => {
                caches.push((cache.to_string(), HashMap::new()));
                caches.len() - 1
            }
        };
        caches[index].1.extend(entries);
        Ok(())
    }

    async fn delete(&self, cache: &str) -> Result<bool, OfflineError> {
        let mut caches = self.caches();
        let before = caches.len();
        caches.retain(|(name, _)| name != cache);
        Ok(caches.len() != before)
    }

    async fn lookup(&self, path: &str) -> Result<Option<CachedResponse>, OfflineError> {
        Ok(self
            .caches()
            .iter()
            .find_map(|(_, entries)| entries.get(path).cloned()))
    }
}
