//! Browser bundle for the Teli watchlist pages.
//!
//! One wasm module serves two contexts. Loaded by a page, it wires the
//! profile menu, flash dismissal, tab highlighting, the import-row toggler
//! and the live search surfaces to the server-rendered markup. Loaded by the
//! service worker shim, it runs the offline cache lifecycle.
//!
//! # Building
//!
//! ```bash
//! wasm-pack build crates/teli-web --target web --out-dir ../../static/pkg
//! ```
//!
//! Pages pass settings as JSON in a `data-teli-config` attribute on `<body>`;
//! anything missing falls back to [`PageConfig::default`].

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;

pub mod dom;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use teli_core::offline::OfflinePlan;
use teli_core::render::CardRenderer;
use teli_core::widgets::tabs::query_param;
use teli_core::widgets::FlashTimeline;

/// Page settings, mirroring the server's configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub debounce_ms: u64,
    pub overview_chars: usize,
    pub image_base: String,
    pub dismiss_after_ms: u64,
    pub fade_ms: u64,
    pub cache_version: String,
    pub assets: Vec<String>,
    pub worker_path: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            overview_chars: 150,
            image_base: "https://image.tmdb.org/t/p/w500".to_string(),
            dismiss_after_ms: 4000,
            fade_ms: 300,
            cache_version: "teli-v1".to_string(),
            assets: vec!["/static/style.css".to_string(), "/static/app.js".to_string()],
            worker_path: "/sw.js".to_string(),
        }
    }
}

impl PageConfig {
    /// Parse the page's config attribute. Absent or unreadable settings give
    /// the defaults, along with the parse error when there was one.
    pub fn from_attribute(raw: Option<&str>) -> (Self, Option<String>) {
        match raw.map(str::trim).filter(|r| !r.is_empty()) {
            None => (Self::default(), None),
            Some(raw) => match serde_json::from_str(raw) {
                Ok(config) => (config, None),
                Err(e) => (Self::default(), Some(e.to_string())),
            },
        }
    }

    /// Settings seen from inside the service worker, which only knows its own
    /// script URL. The cache version travels as `?version=`.
    pub fn for_worker(script_url: &str) -> Self {
        let mut config = Self::default();
        if let Some(version) = query_param(script_url, "version").filter(|v| !v.is_empty()) {
            config.cache_version = version;
        }
        config
    }

    /// URL the page registers the service worker under
    pub fn worker_url(&self) -> String {
        format!(
            "{}?version={}",
            self.worker_path,
            urlencoding::encode(&self.cache_version)
        )
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(1))
    }

    pub fn flash_timeline(&self) -> FlashTimeline {
        FlashTimeline::new(
            Duration::from_millis(self.dismiss_after_ms),
            Duration::from_millis(self.fade_ms),
        )
    }

    pub fn renderer(&self) -> CardRenderer {
        CardRenderer::new(self.image_base.clone(), self.overview_chars.max(1))
    }

    pub fn offline_plan(&self) -> OfflinePlan {
        OfflinePlan::new(self.cache_version.clone(), self.assets.clone())
    }
}
