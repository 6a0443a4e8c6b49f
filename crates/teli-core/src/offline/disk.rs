use super::worker::CacheStorage;
use super::{CachedResponse, OfflineError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sidecar stored next to each cached body
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    path: String,
    status: u16,
    content_type: Option<String>,
    cached_at: DateTime<Utc>,
}

/// Cache storage on disk: one directory per cache, two files per entry
/// (`<path>.body` and `<path>.json`), names percent-encoded.
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, OfflineError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, cache: &str) -> PathBuf {
        self.root.join(urlencoding::encode(cache).as_ref())
    }

    fn entry_paths(dir: &Path, path: &str) -> (PathBuf, PathBuf) {
        let stem = urlencoding::encode(path);
        (
            dir.join(format!("{}.body", stem)),
            dir.join(format!("{}.json", stem)),
        )
    }

    async fn read_entry(&self, dir: &Path, path: &str) -> Result<Option<CachedResponse>, OfflineError> {
        let (body_path, meta_path) = Self::entry_paths(dir, path);
        if !tokio::fs::try_exists(&meta_path).await? {
            return Ok(None);
        }

        let meta = tokio::fs::read_to_string(&meta_path).await?;
        let meta: EntryMeta = match serde_json::from_str(&meta) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(
                    "Offline cache corruption detected for {}: {}. Deleting corrupted entry.",
                    path, e
                );
                for file in [&meta_path, &body_path] {
                    if let Err(rm_err) = tokio::fs::remove_file(file).await {
                        warn!("Failed to delete corrupted cache file: {}", rm_err);
                    }
                }
                return Ok(None);
            }
        };

        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OfflineError::Corrupt(format!("{} has no body", path)));
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Offline cache hit: {} (cached {})", meta.path, meta.cached_at);
        Ok(Some(CachedResponse {
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn keys(&self) -> Result<Vec<String>, OfflineError> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let raw = entry.file_name().to_string_lossy().into_owned();
            match urlencoding::decode(&raw) {
                Ok(name) => names.push(name.into_owned()),
                Err(_) => warn!("Skipping unreadable cache directory {}", raw),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError> {
        let dir = self.cache_dir(cache);
        tokio::fs::create_dir_all(&dir).await?;

        let cached_at = Utc::now();
        for (path, response) in entries {
            let (body_path, meta_path) = Self::entry_paths(&dir, &path);
            let meta = EntryMeta {
                path: path.clone(),
                status: response.status,
                content_type: response.content_type,
                cached_at,
            };
            let meta = serde_json::to_string_pretty(&meta)
                .map_err(|e| OfflineError::Corrupt(e.to_string()))?;

            tokio::fs::write(&body_path, &response.body).await?;
            tokio::fs::write(&meta_path, meta).await?;
            debug!("Offline cache saved: {} in {}", path, cache);
        }
        Ok(())
    }

    async fn delete(&self, cache: &str) -> Result<bool, OfflineError> {
        let dir = self.cache_dir(cache);
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(true)
    }

    async fn lookup(&self, path: &str) -> Result<Option<CachedResponse>, OfflineError> {
        for cache in self.keys().await? {
            let dir = self.cache_dir(&cache);
            if let Some(hit) = self.read_entry(&dir, path).await? {
                return Ok(Some(hit));
            }
        }
        debug!("Offline cache miss: {}", path);
        Ok(None)
    }
}
