//! Markup for search results and surface states.
//!
//! Every server-supplied value goes through [`escape_html`] before it is
//! placed in markup, attribute values included.

use crate::escape::escape_html;
use crate::search::{Card, ControlState, PanelView};
use teli_models::{AddRequest, ImportCandidate, SearchResult};

pub const HINT_START: &str = "Start typing to search...";
pub const HINT_SEARCHING: &str = "Searching...";
pub const HINT_NO_RESULTS: &str = "No results found.";
pub const HINT_FAILED: &str = "Search failed. Please try again.";
pub const ELLIPSIS: &str = "...";

/// What the action control on a card does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Overlay: add to the watchlist
    Add,
    /// Import row: use this as the row's match
    Select,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Add => "+ Add",
            ActionKind::Select => "Select",
        }
    }

    pub fn pending_label(self) -> &'static str {
        match self {
            ActionKind::Add => "Adding...",
            ActionKind::Select => "Saving...",
        }
    }

    pub fn done_label(self) -> &'static str {
        match self {
            ActionKind::Add => "\u{2713} Added",
            ActionKind::Select => "\u{2713} Selected",
        }
    }

    pub fn button_class(self) -> &'static str {
        match self {
            ActionKind::Add => "search-add-btn",
            ActionKind::Select => "inline-select-btn",
        }
    }
}

/// First `max_chars` characters, with an ellipsis when anything was cut
pub fn truncate_overview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

pub fn hint(text: &str) -> String {
    format!(r#"<p class="search-hint">{}</p>"#, escape_html(text))
}

#[derive(Debug, Clone)]
pub struct CardRenderer {
    image_base: String,
    overview_chars: usize,
}

impl CardRenderer {
    pub fn new(image_base: impl Into<String>, overview_chars: usize) -> Self {
        Self {
            image_base: image_base.into().trim_end_matches('/').to_string(),
            overview_chars,
        }
    }

    /// `poster_url` when present, else the image base joined with `poster_path`
    pub fn poster_src(&self, result: &SearchResult) -> Option<String> {
        if let Some(url) = result.poster_url() {
            return Some(url.to_string());
        }
        result
            .poster_path()
            .map(|path| format!("{}/{}", self.image_base, path.trim_start_matches('/')))
    }

    /// Results straight from the server, each with a ready control numbered
    /// by position. Empty or absent input gives the no-results hint.
    pub fn render_results(&self, results: Option<&[SearchResult]>, action: ActionKind) -> String {
        let results = results.unwrap_or_default();
        if results.is_empty() {
            return hint(HINT_NO_RESULTS);
        }

        let cards: Vec<Card> = results
            .iter()
            .enumerate()
            .map(|(i, result)| Card {
                control: crate::search::ControlId::new(i as u32),
                request: AddRequest::from(result),
                result: result.clone(),
                state: ControlState::Ready,
            })
            .collect();
        self.render_cards(&cards, action)
    }

    pub fn render_panel(&self, view: &PanelView, action: ActionKind) -> String {
        match view {
            PanelView::Hint => hint(HINT_START),
            PanelView::Searching => hint(HINT_SEARCHING),
            PanelView::NoResults => hint(HINT_NO_RESULTS),
            PanelView::Failed => hint(HINT_FAILED),
            PanelView::Results(cards) if cards.is_empty() => hint(HINT_NO_RESULTS),
            PanelView::Results(cards) => self.render_cards(cards, action),
        }
    }

    pub fn render_cards(&self, cards: &[Card], action: ActionKind) -> String {
        cards
            .iter()
            .map(|card| self.render_card(card, action))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render_card(&self, card: &Card, action: ActionKind) -> String {
        let result = &card.result;
        let title = escape_html(&result.title);

        let poster = match self.poster_src(result) {
            Some(src) => format!(
                r#"<img class="search-poster" src="{}" alt="{}" loading="lazy">"#,
                escape_html(&src),
                title
            ),
            None => r#"<div class="search-poster search-poster-placeholder">No image</div>"#
                .to_string(),
        };

        let year = result
            .display_year()
            .map(|y| format!(r#" <span class="search-year">({})</span>"#, escape_html(y)))
            .unwrap_or_default();

        let overview = result
            .overview
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .map(|o| {
                format!(
                    r#"<p class="search-overview">{}</p>"#,
                    escape_html(&truncate_overview(o, self.overview_chars))
                )
            })
            .unwrap_or_default();

        format!(
            r#"<div class="search-result" data-tmdb-id="{id}" data-media-type="{media}">
  {poster}
  <div class="search-info">
    <div class="search-title">{title}{year}</div>
    <span class="badge badge-{media}">{badge}</span>
    {overview}
  </div>
  <div class="search-action">{action}</div>
</div>"#,
            id = escape_html(result.tmdb_id.as_str()),
            media = escape_html(result.media_type.as_str()),
            poster = poster,
            title = title,
            year = year,
            badge = escape_html(result.media_type.label()),
            overview = overview,
            action = self.render_action(card, action),
        )
    }

    fn render_action(&self, card: &Card, action: ActionKind) -> String {
        if card.result.on_list {
            return match card.result.list_id {
                Some(list_id) => format!(
                    r#"<a class="btn btn-small search-on-list" href="/detail/{}">On your list</a>"#,
                    list_id
                ),
                None => r#"<span class="search-on-list">On your list</span>"#.to_string(),
            };
        }

        match card.state {
            ControlState::Ready => format!(
                r#"<button type="button" class="btn btn-small {}" data-control="{}">{}</button>"#,
                action.button_class(),
                card.control,
                escape_html(action.label())
            ),
            ControlState::Pending => format!(
                r#"<button type="button" class="btn btn-small {}" data-control="{}" disabled>{}</button>"#,
                action.button_class(),
                card.control,
                escape_html(action.pending_label())
            ),
            ControlState::Done => format!(
                r#"<span class="search-added">{}</span>"#,
                escape_html(action.done_label())
            ),
        }
    }

    /// Display half of an import row: the current match with its "Change"
    /// action, or a not-found note
    pub fn render_row_match(&self, index: usize, candidate: &ImportCandidate) -> String {
        let Some(matched) = &candidate.matched else {
            return format!(
                r#"<div class="import-match import-no-match" data-row="{}">No match for &ldquo;{}&rdquo; <button type="button" class="btn btn-small import-change-btn" data-row="{}">Search</button></div>"#,
                index,
                escape_html(&candidate.query),
                index
            );
        };

        let year = matched
            .display_year()
            .map(|y| format!(" ({})", escape_html(y)))
            .unwrap_or_default();
        let listed = if matched.on_list {
            r#" <span class="badge badge-on-list">On your list</span>"#
        } else {
            ""
        };

        format!(
            r#"<div class="import-match" data-row="{index}"><span class="import-title">{title}{year}</span> <span class="badge badge-{media}">{badge}</span>{listed} <button type="button" class="btn btn-small import-change-btn" data-row="{index}">Change</button></div>"#,
            index = index,
            title = escape_html(&matched.title),
            year = year,
            media = escape_html(matched.media_type.as_str()),
            badge = escape_html(matched.media_type.label()),
            listed = listed,
        )
    }

    /// Hidden inputs for an import row; disabled inputs are not submitted
    pub fn render_row_fields(&self, index: usize, fields: &[(&str, String)], disabled: bool) -> String {
        fields
            .iter()
            .map(|(name, value)| {
                format!(
                    r#"<input type="hidden" name="{}" value="{}" data-row="{}"{}>"#,
                    escape_html(name),
                    escape_html(value),
                    index,
                    if disabled { " disabled" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

impl Default for CardRenderer {
    fn default() -> Self {
        Self::new("https://image.tmdb.org/t/p/w500", 150)
    }
}

#[cfg(test)]
mod tests;
