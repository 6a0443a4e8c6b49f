use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of catalog entry. The server only ever returns these two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Value used in form fields and query strings
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Badge label shown on result cards
    pub fn label(self) -> &'static str {
        match self {
            MediaType::Movie => "Movie",
            MediaType::Tv => "TV Show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External catalog identifier (TMDB).
///
/// The search endpoint has sent both numbers and strings for this field over
/// time, so it is accepted in either shape and kept as text. It is only ever
/// echoed back to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTmdbId", into = "String")]
pub struct TmdbId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTmdbId {
    Number(u64),
    Text(String),
}

impl From<RawTmdbId> for TmdbId {
    fn from(raw: RawTmdbId) -> Self {
        match raw {
            RawTmdbId::Number(n) => TmdbId(n.to_string()),
            RawTmdbId::Text(s) => TmdbId(s.trim().to_string()),
        }
    }
}

impl From<TmdbId> for String {
    fn from(id: TmdbId) -> Self {
        id.0
    }
}

impl TmdbId {
    pub fn new(id: impl Into<String>) -> Self {
        TmdbId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TmdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
