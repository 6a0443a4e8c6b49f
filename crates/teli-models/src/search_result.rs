use crate::media::{MediaType, TmdbId};
use serde::{Deserialize, Serialize};

/// One match returned by `GET /api/search`.
///
/// The client never keeps a canonical copy of these; they are rendered and
/// resubmitted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub tmdb_id: TmdbId,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub on_list: bool,
    #[serde(default)]
    pub list_id: Option<i64>,
}

impl SearchResult {
    /// Year for display. The server sends `""` when the release date is unknown.
    pub fn display_year(&self) -> Option<&str> {
        self.year.as_deref().map(str::trim).filter(|y| !y.is_empty())
    }

    /// Poster path with empty strings treated as missing
    pub fn poster_path(&self) -> Option<&str> {
        self.poster_path.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn poster_url(&self) -> Option<&str> {
        self.poster_url.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Watchlist item id when the result is already listed
    pub fn listed_id(&self) -> Option<i64> {
        if self.on_list {
            self.list_id
        } else {
            None
        }
    }
}

/// Body of `GET /api/search`. A missing `results` key reads as no results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_results_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_parse_server_shape() {
        let body = r#"{"results":[{"tmdb_id":27205,"media_type":"movie","title":"Inception",
            "year":"2010","poster_url":null,"poster_path":"/abc.jpg","overview":"Dreams",
            "on_list":true,"list_id":12}]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let result = &response.results[0];
        assert_eq!(result.tmdb_id.as_str(), "27205");
        assert_eq!(result.media_type, MediaType::Movie);
        assert_eq!(result.display_year(), Some("2010"));
        assert_eq!(result.poster_url(), None);
        assert_eq!(result.listed_id(), Some(12));
    }

    #[test]
    fn test_empty_year_is_absent() {
        let body = r#"{"tmdb_id":"1","media_type":"tv","title":"Show","year":""}"#;
        let result: SearchResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.display_year(), None);
        assert!(!result.on_list);
        assert_eq!(result.listed_id(), None);
    }
}
