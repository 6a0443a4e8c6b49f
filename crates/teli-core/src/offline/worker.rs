use super::{CachedResponse, OfflineError, OfflinePlan};
use async_trait::async_trait;
use futures::future::try_join_all;
use teli_client::HttpClient;
use tracing::{debug, info, warn};

/// Where the worker fetches from
#[async_trait]
pub trait Network: Send + Sync {
    /// Resolves for any HTTP status; only transport failures are errors
    async fn fetch(&self, path: &str) -> Result<CachedResponse, OfflineError>;
}

/// Named response caches, in the shape of the browser's cache storage
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn keys(&self) -> Result<Vec<String>, OfflineError>;

    /// Open (creating if needed) `cache` and store every entry in it
    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError>;

    async fn delete(&self, cache: &str) -> Result<bool, OfflineError>;

    /// First match for `path` across all caches
    async fn lookup(&self, path: &str) -> Result<Option<CachedResponse>, OfflineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Network,
    Cache,
}

pub struct OfflineWorker<S, N> {
    plan: OfflinePlan,
    storage: S,
    network: N,
}

impl<S: CacheStorage, N: Network> OfflineWorker<S, N> {
    pub fn new(plan: OfflinePlan, storage: S, network: N) -> Self {
        Self {
            plan,
            storage,
            network,
        }
    }

    pub fn plan(&self) -> &OfflinePlan {
        &self.plan
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Precache every asset into the current version's cache. All assets are
    /// fetched before anything is written, so a failure leaves no partial
    /// cache behind.
    pub async fn install(&self) -> Result<usize, OfflineError> {
        let fetches = self.plan.assets().iter().map(|path| async move {
            let response = self.network.fetch(path).await?;
            if !response.is_ok() {
                return Err(OfflineError::Status {
                    path: path.clone(),
                    status: response.status,
                });
            }
            Ok((path.clone(), response))
        });

        let entries = match try_join_all(fetches).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Offline cache install failed: {}", e);
                return Err(e);
            }
        };

        let count = entries.len();
        self.storage.put_all(self.plan.version(), entries).await?;
        info!("Installed offline cache {} ({} assets)", self.plan.version(), count);
        Ok(count)
    }

    /// Delete every cache that is not the current version
    pub async fn activate(&self) -> Result<Vec<String>, OfflineError> {
        let names = self.storage.keys().await?;
        let stale = self.plan.stale_caches(&names);

        for name in &stale {
            self.storage.delete(name).await?;
            info!("Deleted stale offline cache {}", name);
        }
        Ok(stale)
    }

    /// Network first; on a transport failure, fall back to any cached copy.
    /// With no cached copy the original failure is returned.
    pub async fn fetch(&self, path: &str) -> Result<(CachedResponse, FetchSource), OfflineError> {
        let network_error = match self.network.fetch(path).await {
            Ok(response) => return Ok((response, FetchSource::Network)),
            Err(e) => e,
        };

        debug!("Network fetch of {} failed ({}), trying cache", path, network_error);
        match self.storage.lookup(path).await {
            Ok(Some(cached)) => Ok((cached, FetchSource::Cache)),
            Ok(None) => Err(network_error),
            Err(e) => {
                warn!("Offline cache lookup for {} failed: {}", path, e);
                Err(network_error)
            }
        }
    }
}

#[async_trait]
impl Network for HttpClient {
    async fn fetch(&self, path: &str) -> Result<CachedResponse, OfflineError> {
        let raw = self.get_raw(path).await.map_err(|e| OfflineError::Network {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(CachedResponse {
            status: raw.status,
            content_type: raw.content_type,
            body: raw.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::MemoryCacheStorage;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Serves fixed bodies while online; every request fails while offline
    #[derive(Clone)]
    struct FakeNetwork {
        online: Arc<AtomicBool>,
        pages: Arc<HashMap<String, CachedResponse>>,
    }

    impl FakeNetwork {
        fn new(pages: &[(&str, u16, &str)]) -> Self {
            let pages = pages
                .iter()
                .map(|(path, status, body)| {
                    (
                        path.to_string(),
                        CachedResponse {
                            status: *status,
                            content_type: Some("text/plain".to_string()),
                            body: body.as_bytes().to_vec(),
                        },
                    )
                })
                .collect();
            Self {
                online: Arc::new(AtomicBool::new(true)),
                pages: Arc::new(pages),
            }
        }

        fn go_offline(&self) {
            self.online.store(false, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, path: &str) -> Result<CachedResponse, OfflineError> {
            if !self.online.load(Ordering::SeqCst) {
                return Err(OfflineError::Network {
                    path: path.to_string(),
                    message: "offline".to_string(),
                });
            }
            Ok(self.pages.get(path).cloned().unwrap_or(CachedResponse {
                status: 404,
                content_type: None,
                body: Vec::new(),
            }))
        }
    }

    fn plan(version: &str) -> OfflinePlan {
        OfflinePlan::new(
            version,
            vec!["/static/style.css".to_string(), "/static/app.js".to_string()],
        )
    }

    fn assets() -> FakeNetwork {
        FakeNetwork::new(&[
            ("/static/style.css", 200, "body{}"),
            ("/static/app.js", 200, "main()"),
        ])
    }

    #[tokio::test]
    async fn test_install_precaches_assets() {
        let network = assets();
        let worker = OfflineWorker::new(plan("teli-v1"), MemoryCacheStorage::new(), network.clone());
        assert_eq!(worker.install().await.unwrap(), 2);
        assert_eq!(worker.storage().keys().await.unwrap(), vec!["teli-v1"]);
        let css = worker.storage().lookup("/static/style.css").await.unwrap().unwrap();
        assert_eq!(css.body, b"body{}");
    }

    #[tokio::test]
    async fn test_install_failure_leaves_no_cache() {
        let network = FakeNetwork::new(&[("/static/style.css", 200, "body{}")]);
        let worker = OfflineWorker::new(plan("teli-v1"), MemoryCacheStorage::new(), network.clone());
        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, OfflineError::Status { status: 404, .. }));
        assert!(worker.storage().keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_evicts_every_other_version() {
        let network = assets();
        let storage = MemoryCacheStorage::new();
        for old in ["teli-v0", "teli-v1", "scratch"] {
            storage.put_all(old, Vec::new()).await.unwrap();
        }

        let worker = OfflineWorker::new(plan("teli-v2"), storage, network.clone());
        worker.install().await.unwrap();
        let deleted = worker.activate().await.unwrap();

        assert_eq!(deleted, vec!["teli-v0", "teli-v1", "scratch"]);
        assert_eq!(worker.storage().keys().await.unwrap(), vec!["teli-v2"]);
        assert!(worker.activate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_network_first() {
        let network = assets();
        let worker = OfflineWorker::new(plan("teli-v1"), MemoryCacheStorage::new(), network.clone());
        worker.install().await.unwrap();

        let (_, source) = worker.fetch("/static/app.js").await.unwrap();
        assert_eq!(source, FetchSource::Network);

        // Non-2xx is still a network answer, not a reason to use the cache
        let (missing, source) = worker.fetch("/nope").await.unwrap();
        assert_eq!((missing.status, source), (404, FetchSource::Network));
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_cache_when_offline() {
        let network = assets();
        let worker = OfflineWorker::new(plan("teli-v1"), MemoryCacheStorage::new(), network.clone());
        worker.install().await.unwrap();
        network.go_offline();

        let (cached, source) = worker.fetch("/static/app.js").await.unwrap();
        assert_eq!(source, FetchSource::Cache);
        assert_eq!(cached.body, b"main()");

        let err = worker.fetch("/watchlist").await.unwrap_err();
        assert!(matches!(err, OfflineError::Network { .. }));
    }
}
