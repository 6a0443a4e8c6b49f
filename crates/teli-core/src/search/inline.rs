use super::{Command, ControlId, RowIndex, SearchContext, SearchPanel};
use crate::debounce::Generation;
use crate::widgets::import_rows::{field_state, FieldState, HIDDEN_FIELDS};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use teli_models::{AddRequest, ImportCandidate, SearchResult};
use tracing::{debug, info};

/// One line of the import review list.
///
/// A row is either showing its confirmed match (with a "Change" action) or
/// its inline search panel, never both.
#[derive(Debug, Clone)]
pub struct ImportRow {
    index: RowIndex,
    query: String,
    matched: Option<SearchResult>,
    included: bool,
    searching: bool,
    panel: SearchPanel,
}

impl ImportRow {
    pub fn index(&self) -> RowIndex {
        self.index
    }

    /// The title as it was pasted
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matched(&self) -> Option<&SearchResult> {
        self.matched.as_ref()
    }

    /// Checkbox state
    pub fn is_included(&self) -> bool {
        self.included
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn panel(&self) -> &SearchPanel {
        &self.panel
    }

    /// Hidden form fields follow the checkbox
    pub fn fields(&self) -> FieldState {
        field_state(self.included)
    }

    /// Hidden field values for the current match
    pub fn hidden_fields(&self) -> Option<Vec<(&'static str, String)>> {
        self.matched
            .as_ref()
            .map(|m| AddRequest::from(m).form_pairs())
    }
}

/// Per-row state of the import review page, keyed by row index.
///
/// Each row owns its own panel and debounce, so opening one row's search does
/// not close or disturb another's.
#[derive(Debug, Clone)]
pub struct ImportReview {
    rows: BTreeMap<RowIndex, ImportRow>,
}

impl ImportReview {
    /// Rows start checked when they have a match that is not already listed
    pub fn new(candidates: Vec<ImportCandidate>, debounce: Duration) -> Self {
        let rows = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let included = candidate.matched.as_ref().is_some_and(|m| !m.on_list);
                let row = ImportRow {
                    index,
                    query: candidate.query,
                    matched: candidate.matched,
                    included,
                    searching: false,
                    panel: SearchPanel::new(SearchContext::Row(index), debounce),
                };
                (index, row)
            })
            .collect();
        Self { rows }
    }

    pub fn empty() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: RowIndex) -> Option<&ImportRow> {
        self.rows.get(&index)
    }

    pub fn rows(&self) -> impl Iterator<Item = &ImportRow> {
        self.rows.values()
    }

    /// "Change" clicked: show the row's search panel, prefilled with the
    /// pasted title and already counting down to a search.
    pub fn change(&mut self, index: RowIndex) -> Vec<Command> {
        let Some(row) = self.rows.get_mut(&index) else {
            return Vec::new();
        };
        if row.searching {
            return Vec::new();
        }

        row.searching = true;
        let query = row.query.clone();
        let mut commands = row.panel.reset(&query);
        commands.extend(row.panel.rearm());
        commands.push(Command::Focus {
            context: SearchContext::Row(index),
        });
        debug!("row {} searching", index);
        commands
    }

    /// Back to display without changing the match
    pub fn close(&mut self, index: RowIndex) -> Vec<Command> {
        let Some(row) = self.rows.get_mut(&index) else {
            return Vec::new();
        };
        if !row.searching {
            return Vec::new();
        }
        row.searching = false;
        let query = row.query.clone();
        row.panel.reset(&query)
    }

    pub fn input(&mut self, index: RowIndex, text: &str) -> Vec<Command> {
        match self.rows.get_mut(&index) {
            Some(row) if row.searching => row.panel.input(text),
            _ => Vec::new(),
        }
    }

    pub fn timer_fired(&mut self, index: RowIndex, generation: Generation) -> Vec<Command> {
        match self.rows.get_mut(&index) {
            Some(row) if row.searching => row.panel.timer_fired(generation),
            _ => Vec::new(),
        }
    }

    pub fn results_arrived<E: fmt::Display>(
        &mut self,
        index: RowIndex,
        seq: u64,
        result: Result<Vec<SearchResult>, E>,
    ) -> bool {
        match self.rows.get_mut(&index) {
            Some(row) => row.panel.results_arrived(seq, result),
            None => false,
        }
    }

    pub fn select(&mut self, index: RowIndex, control: ControlId) -> Vec<Command> {
        match self.rows.get_mut(&index) {
            Some(row) if row.searching => row.panel.begin_submit(control).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// A selection was saved: the row shows the new match and closes its
    /// panel. On failure the panel stays open with the control re-enabled.
    pub fn select_finished<E: fmt::Display>(
        &mut self,
        index: RowIndex,
        control: ControlId,
        result: Result<(), E>,
    ) -> Vec<Command> {
        let Some(row) = self.rows.get_mut(&index) else {
            return Vec::new();
        };
        let Some(selected) = row.panel.finish_submit(control, result) else {
            return Vec::new();
        };

        info!("row {} now matches {:?}", index, selected.title);
        row.matched = Some(selected);
        row.included = true;
        row.searching = false;
        let query = row.query.clone();
        let mut commands = row.panel.reset(&query);
        commands.push(Command::SetFields {
            row: index,
            state: row.fields(),
        });
        commands
    }

    /// Checkbox toggled. Rows without a match cannot be included.
    pub fn set_included(&mut self, index: RowIndex, checked: bool) -> FieldState {
        match self.rows.get_mut(&index) {
            Some(row) => {
                row.included = checked && row.matched.is_some();
                row.fields()
            }
            None => FieldState::Disabled,
        }
    }

    /// Field state for every row, used once at load to line the hidden
    /// fields up with the checkboxes
    pub fn field_states(&self) -> Vec<(RowIndex, FieldState)> {
        self.rows.values().map(|r| (r.index, r.fields())).collect()
    }

    /// What the bulk import form submits: parallel lists over the checked
    /// rows only, in row order
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let included: Vec<Vec<(&'static str, String)>> = self
            .rows
            .values()
            .filter(|r| r.fields() == FieldState::Enabled)
            .filter_map(ImportRow::hidden_fields)
            .collect();

        let mut fields = Vec::with_capacity(included.len() * HIDDEN_FIELDS.len());
        for name in HIDDEN_FIELDS {
            for row in &included {
                if let Some((_, value)) = row.iter().find(|(n, _)| *n == name) {
                    fields.push((name, value.clone()));
                }
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ControlState, PanelView};
    use teli_models::{MediaType, TmdbId};

    fn result(id: &str, title: &str) -> SearchResult {
        SearchResult {
            tmdb_id: TmdbId::new(id),
            media_type: MediaType::Movie,
            title: title.to_string(),
            year: Some("1999".to_string()),
            poster_path: Some("/p.jpg".to_string()),
            poster_url: None,
            overview: Some("overview".to_string()),
            on_list: false,
            list_id: None,
        }
    }

    fn review() -> ImportReview {
        ImportReview::new(
            vec![
                ImportCandidate {
                    query: "matrix".to_string(),
                    matched: Some(result("603", "The Matrix")),
                },
                ImportCandidate {
                    query: "qwxz".to_string(),
                    matched: None,
                },
                ImportCandidate {
                    query: "heat".to_string(),
                    matched: Some(result("949", "Heat")),
                },
            ],
            Duration::from_millis(400),
        )
    }

    fn settle(review: &mut ImportReview, index: RowIndex, commands: Vec<Command>) -> u64 {
        let generation = commands
            .iter()
            .find_map(|c| match c {
                Command::StartTimer { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("timer started");
        match review.timer_fired(index, generation).as_slice() {
            [Command::Fetch { seq, .. }] => *seq,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_initial_field_states() {
        let review = review();
        assert_eq!(
            review.field_states(),
            vec![
                (0, FieldState::Enabled),
                (1, FieldState::Disabled),
                (2, FieldState::Enabled),
            ]
        );
    }

    #[test]
    fn test_unchecked_rows_excluded_from_form() {
        let mut review = review();
        assert_eq!(review.set_included(0, false), FieldState::Disabled);
        let fields = review.form_fields();
        let ids: Vec<&str> = fields
            .iter()
            .filter(|(n, _)| *n == "tmdb_id")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ids, vec!["949"]);
        assert_eq!(fields.len(), HIDDEN_FIELDS.len());
    }

    #[test]
    fn test_unmatched_row_cannot_be_checked() {
        let mut review = review();
        assert_eq!(review.set_included(1, true), FieldState::Disabled);
        assert!(!review.row(1).unwrap().is_included());
    }

    #[test]
    fn test_change_prefills_and_searches() {
        let mut review = review();
        let commands = review.change(1);
        assert!(review.row(1).unwrap().is_searching());
        assert_eq!(review.row(1).unwrap().panel().query(), "qwxz");
        assert!(commands.contains(&Command::Focus {
            context: SearchContext::Row(1)
        }));
        let seq = settle(&mut review, 1, commands);
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_rows_are_independent() {
        let mut review = review();
        let c0 = review.change(0);
        let c2 = review.change(2);
        assert!(review.row(0).unwrap().is_searching());
        assert!(review.row(2).unwrap().is_searching());

        let s0 = settle(&mut review, 0, c0);
        let s2 = settle(&mut review, 2, c2);
        review.results_arrived::<String>(0, s0, Ok(vec![result("1", "Zero")]));
        review.results_arrived::<String>(2, s2, Ok(Vec::new()));
        assert_eq!(review.row(0).unwrap().panel().view().cards().len(), 1);
        assert_eq!(review.row(2).unwrap().panel().view(), &PanelView::NoResults);

        review.close(2);
        assert!(review.row(0).unwrap().is_searching());
        assert!(!review.row(2).unwrap().is_searching());
    }

    #[test]
    fn test_select_replaces_match_and_closes() {
        let mut review = review();
        let commands = review.change(1);
        let seq = settle(&mut review, 1, commands);
        review.results_arrived::<String>(1, seq, Ok(vec![result("62", "The Shining")]));
        let control = review.row(1).unwrap().panel().view().cards()[0].control;

        let submit = review.select(1, control);
        assert!(matches!(submit.as_slice(), [Command::Submit { .. }]));
        assert!(review.select(1, control).is_empty());

        review.select_finished::<String>(1, control, Ok(()));
        let row = review.row(1).unwrap();
        assert!(!row.is_searching());
        assert!(row.is_included());
        assert_eq!(row.matched().unwrap().title, "The Shining");
        assert_eq!(row.hidden_fields().unwrap()[0], ("tmdb_id", "62".to_string()));
    }

    #[test]
    fn test_select_rechecks_an_unchecked_row() {
        let mut review = review();
        review.set_included(0, false);
        let commands = review.change(0);
        let seq = settle(&mut review, 0, commands);
        review.results_arrived::<String>(0, seq, Ok(vec![result("680", "Pulp Fiction")]));
        let control = review.row(0).unwrap().panel().view().cards()[0].control;
        review.select(0, control);

        let commands = review.select_finished::<String>(0, control, Ok(()));
        assert!(commands.contains(&Command::SetFields {
            row: 0,
            state: FieldState::Enabled,
        }));
        assert!(review.row(0).unwrap().is_included());
        assert_eq!(review.form_fields()[0], ("tmdb_id", "680".to_string()));
    }

    #[test]
    fn test_failed_select_keeps_panel_open() {
        let mut review = review();
        let commands = review.change(0);
        let seq = settle(&mut review, 0, commands);
        review.results_arrived::<String>(0, seq, Ok(vec![result("5", "Other")]));
        let control = review.row(0).unwrap().panel().view().cards()[0].control;
        review.select(0, control);
        review.select_finished(0, control, Err("timeout"));

        let row = review.row(0).unwrap();
        assert!(row.is_searching());
        assert_eq!(row.matched().unwrap().title, "The Matrix");
        assert_eq!(row.panel().card(control).unwrap().state, ControlState::Ready);
    }
}
