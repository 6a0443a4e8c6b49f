use crate::media::{MediaType, TmdbId};
use crate::search_result::SearchResult;
use serde::{Deserialize, Serialize};

/// Form body for `POST /add`.
///
/// Built from a rendered result at render time so the click handler never
/// has to read payload fields back out of markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    pub tmdb_id: TmdbId,
    pub media_type: MediaType,
    pub title: String,
    pub year: String,
    pub poster_path: String,
    /// Full overview, never the truncated card text
    pub overview: String,
}

impl AddRequest {
    /// Field pairs in the order the server's form parser expects
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tmdb_id", self.tmdb_id.to_string()),
            ("media_type", self.media_type.as_str().to_string()),
            ("title", self.title.clone()),
            ("year", self.year.clone()),
            ("poster_path", self.poster_path.clone()),
            ("overview", self.overview.clone()),
        ]
    }
}

impl From<&SearchResult> for AddRequest {
    fn from(result: &SearchResult) -> Self {
        Self {
            tmdb_id: result.tmdb_id.clone(),
            media_type: result.media_type,
            title: result.title.clone(),
            year: result.display_year().unwrap_or_default().to_string(),
            poster_path: result.poster_path().unwrap_or_default().to_string(),
            overview: result.overview.clone().unwrap_or_default(),
        }
    }
}

/// Acknowledgement body from `POST /add`. Only parse success matters; the
/// fields are kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddAck(pub serde_json::Value);

impl AddAck {
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(|m| m.as_str())
    }

    pub fn list_id(&self) -> Option<i64> {
        self.0.get("list_id").and_then(|v| v.as_i64())
    }
}
