use serde::{Deserialize, Serialize};

/// Watchlist section an item sits in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    /// Want to watch
    Want,
    /// Currently watching
    Progress,
    /// Finished
    Watched,
}

impl ListStatus {
    pub fn label(self) -> &'static str {
        match self {
            ListStatus::Want => "Want to Watch",
            ListStatus::Progress => "In Progress",
            ListStatus::Watched => "Watched",
        }
    }
}
