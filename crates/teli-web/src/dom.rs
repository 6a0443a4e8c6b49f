//! Element ids, classes and attributes shared with the server templates, and
//! the mapping from what was clicked to a search event.

use teli_core::search::{ControlId, RowIndex, SearchContext, UiEvent};

pub const CONFIG_ATTR: &str = "data-teli-config";

pub const PROFILE_BUTTON: &str = "profile-btn";
pub const PROFILE_MENU: &str = "profile-menu";
pub const OPEN_CLASS: &str = "open";

pub const FLASH_SELECTOR: &str = ".flash";
pub const FLASH_CATEGORY_ATTR: &str = "data-category";
pub const TAB_SELECTOR: &str = ".tab-bar a";
pub const ACTIVE_CLASS: &str = "active";
pub const HIDDEN_CLASS: &str = "hidden";

pub const SEARCH_OVERLAY: &str = "search-overlay";
pub const SEARCH_INPUT: &str = "search-input";
pub const SEARCH_RESULTS: &str = "search-results";
pub const SEARCH_OPEN_SELECTOR: &str = "[data-open-search]";
pub const SEARCH_CLOSE: &str = "search-close";

/// JSON list of import candidates embedded by the import review page
pub const IMPORT_CANDIDATES: &str = "import-candidates";
pub const INCLUDE_SELECTOR: &str = "input.import-include";
pub const CHANGE_SELECTOR: &str = ".import-change-btn";
pub const ROW_CLOSE_SELECTOR: &str = ".row-search-close";
pub const ROW_RESULTS_SELECTOR: &str = ".row-search-results";
pub const CONTROL_SELECTOR: &str = "[data-control]";

pub const ROW_ATTR: &str = "data-row";
pub const CONTROL_ATTR: &str = "data-control";

/// Per-row element ids
pub const ROW_MATCH_PREFIX: &str = "import-match";
pub const ROW_FIELDS_PREFIX: &str = "import-fields";
pub const ROW_PANEL_PREFIX: &str = "row-search";
pub const ROW_INPUT_PREFIX: &str = "row-search-input";
pub const ROW_RESULTS_PREFIX: &str = "row-search-results";

pub fn row_id(prefix: &str, index: RowIndex) -> String {
    format!("{}-{}", prefix, index)
}

pub fn parse_row(value: &str) -> Option<RowIndex> {
    value.trim().parse().ok()
}

/// The nearest marked element a click landed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickHit<'a> {
    OpenSearch,
    CloseSearch,
    /// An action control; `row` is set when it sits in an import row panel
    Control {
        control: &'a str,
        row: Option<&'a str>,
    },
    ChangeRow(&'a str),
    CloseRow(&'a str),
}

/// Event for a click, or `None` when the markup it carries is unusable
pub fn click_event(hit: ClickHit<'_>) -> Option<UiEvent> {
    match hit {
        ClickHit::OpenSearch => Some(UiEvent::OpenOverlay),
        ClickHit::CloseSearch => Some(UiEvent::CloseOverlay),
        ClickHit::Control { control, row } => {
            let control = ControlId::parse(control)?;
            let context = match row {
                Some(row) => SearchContext::Row(parse_row(row)?),
                None => SearchContext::Overlay,
            };
            Some(UiEvent::Activate { context, control })
        }
        ClickHit::ChangeRow(row) => parse_row(row).map(UiEvent::ChangeRow),
        ClickHit::CloseRow(row) => parse_row(row).map(UiEvent::CloseRow),
    }
}

pub fn key_event(key: &str) -> Option<UiEvent> {
    (key == "Escape").then_some(UiEvent::Escape)
}

/// Search surface an input element belongs to, from its id
pub fn input_context(id: &str) -> Option<SearchContext> {
    if id == SEARCH_INPUT {
        return Some(SearchContext::Overlay);
    }
    id.strip_prefix(ROW_INPUT_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(parse_row)
        .map(SearchContext::Row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_ids() {
        assert_eq!(row_id(ROW_PANEL_PREFIX, 3), "row-search-3");
        assert_eq!(parse_row(" 12 "), Some(12));
        assert_eq!(parse_row("x"), None);
    }

    #[test]
    fn test_click_events() {
        assert_eq!(click_event(ClickHit::OpenSearch), Some(UiEvent::OpenOverlay));
        assert_eq!(
            click_event(ClickHit::Control {
                control: "4",
                row: None
            }),
            Some(UiEvent::Activate {
                context: SearchContext::Overlay,
                control: ControlId::new(4),
            })
        );
        assert_eq!(
            click_event(ClickHit::Control {
                control: "0",
                row: Some("2")
            }),
            Some(UiEvent::Activate {
                context: SearchContext::Row(2),
                control: ControlId::new(0),
            })
        );
        assert_eq!(click_event(ClickHit::ChangeRow("7")), Some(UiEvent::ChangeRow(7)));
        assert_eq!(
            click_event(ClickHit::Control {
                control: "<b>",
                row: None
            }),
            None
        );
        assert_eq!(click_event(ClickHit::CloseRow("")), None);
    }

    #[test]
    fn test_input_context() {
        assert_eq!(input_context("search-input"), Some(SearchContext::Overlay));
        assert_eq!(input_context("row-search-input-5"), Some(SearchContext::Row(5)));
        assert_eq!(input_context("row-search-results-5"), None);
        assert_eq!(input_context("email"), None);
    }

    #[test]
    fn test_only_escape_maps() {
        assert_eq!(key_event("Escape"), Some(UiEvent::Escape));
        assert_eq!(key_event("Enter"), None);
    }
}
