use crate::search_result::SearchResult;
use serde::{Deserialize, Serialize};

/// A pasted title and its best match, as shown on the import review page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportCandidate {
    pub query: String,
    /// `match` on the wire, as the import search page embeds it
    #[serde(default, rename = "match", alias = "matched")]
    pub matched: Option<SearchResult>,
}

/// Split pasted text into one title per line, dropping blank lines.
pub fn parse_titles(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_read_server_match_key() {
        let body = r#"[
            {"query": "heat", "match": {"tmdb_id": 949, "media_type": "movie", "title": "Heat", "year": "1995"}},
            {"query": "qwxz", "match": null}
        ]"#;
        let candidates: Vec<ImportCandidate> = serde_json::from_str(body).unwrap();
        assert_eq!(candidates[0].matched.as_ref().unwrap().title, "Heat");
        assert!(candidates[1].matched.is_none());

        let legacy: ImportCandidate =
            serde_json::from_str(r#"{"query": "heat", "matched": {"tmdb_id": "949", "media_type": "movie", "title": "Heat"}}"#)
                .unwrap();
        assert_eq!(legacy.matched.unwrap().tmdb_id.as_str(), "949");

        let json = serde_json::to_value(&candidates[0]).unwrap();
        assert!(json.get("match").is_some());
    }

    #[test]
    fn test_parse_titles() {
        let titles = parse_titles("  Inception \n\n\r\nThe Wire\n   \n");
        assert_eq!(titles, vec!["Inception".to_string(), "The Wire".to_string()]);
    }
}
