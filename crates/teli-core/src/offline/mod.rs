//! Offline asset cache: the install / activate / fetch lifecycle of the
//! page's background cache worker.
//!
//! [`OfflinePlan`] holds the pure parts (which assets, which caches are
//! stale). With the `runtime` feature, [`OfflineWorker`] runs the lifecycle
//! against any [`CacheStorage`] and [`Network`].

#[cfg(feature = "runtime")]
mod disk;
#[cfg(feature = "runtime")]
mod memory;
#[cfg(feature = "runtime")]
mod worker;

#[cfg(feature = "runtime")]
pub use disk::DiskCacheStorage;
#[cfg(feature = "runtime")]
pub use memory::MemoryCacheStorage;
#[cfg(feature = "runtime")]
pub use worker::{CacheStorage, FetchSource, Network, OfflineWorker};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("network request for {path} failed: {message}")]
    Network { path: String, message: String },

    #[error("precache of {path} got HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("cache storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("cache entry is corrupt: {0}")]
    Corrupt(String),
}

/// A stored response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cache version and precache list. Bumping the version is the only way
/// old caches get evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflinePlan {
    version: String,
    assets: Vec<String>,
}

impl OfflinePlan {
    pub fn new(version: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            version: version.into(),
            assets,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Every cache name except the current version
    pub fn stale_caches<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| *name != self.version.as_str())
            .map(str::to_string)
            .collect()
    }

    /// Only GETs are intercepted; anything else goes straight to the network
    pub fn intercepts(method: &str) -> bool {
        method.eq_ignore_ascii_case("GET")
    }
}
