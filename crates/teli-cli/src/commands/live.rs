//! `teli live`: the overlay search session driven from stdin.
//!
//! Each line replaces the whole query, like editing the search box. Lines
//! starting with `:` are commands.

use super::search::title_with_year;
use super::Context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use serde_json::json;
use std::sync::Arc;
use teli_core::render::{
    truncate_overview, ActionKind, HINT_FAILED, HINT_NO_RESULTS, HINT_SEARCHING, HINT_START,
};
use teli_core::{
    Card, ControlState, ImportReview, Observer, OverlaySession, PanelView, SearchContext,
    SearchDriver, SearchState, UiEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveInput {
    Query(String),
    /// 1-based result number
    Add(usize),
    Close,
    Help,
}

pub fn parse_line(line: &str) -> Result<LiveInput> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return Ok(LiveInput::Query(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("add"), Some(n), None) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Ok(LiveInput::Add(n)),
            _ => Err(eyre!("':add' takes a result number from the table, got {:?}", n)),
        },
        (Some("close") | Some("q") | Some("quit"), None, None) => Ok(LiveInput::Close),
        (Some("help") | Some("h"), None, None) => Ok(LiveInput::Help),
        _ => Err(eyre!("Unknown command {:?}, try :help", trimmed)),
    }
}

const HELP: &str = "Type to search. :add N adds result N, :close ends the session.";

/// Prints the overlay whenever what it shows changes
pub struct TerminalObserver<'a> {
    output: &'a Output,
    overview_chars: usize,
    last: Option<PanelView>,
    reloads: usize,
}

impl<'a> TerminalObserver<'a> {
    pub fn new(output: &'a Output, overview_chars: usize) -> Self {
        Self {
            output,
            overview_chars,
            last: None,
            reloads: 0,
        }
    }

    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// Remember `view` and say whether it differs from the last one shown
    fn is_new(&mut self, view: &PanelView) -> bool {
        if self.last.as_ref() == Some(view) {
            return false;
        }
        self.last = Some(view.clone());
        true
    }

    fn show(&self, query: &str, view: &PanelView) {
        if !self.output.is_human() {
            let results: Vec<_> = view
                .cards()
                .iter()
                .map(|card| json!({ "result": card.result, "state": state_name(card.state) }))
                .collect();
            self.output.json(&json!({
                "type": "panel",
                "query": query,
                "view": view_name(view),
                "results": results,
            }));
            return;
        }

        match view {
            PanelView::Hint => self.output.hint(HINT_START),
            PanelView::Searching => self.output.hint(HINT_SEARCHING),
            PanelView::NoResults => self.output.hint(HINT_NO_RESULTS),
            PanelView::Failed => self.output.warn(HINT_FAILED),
            PanelView::Results(cards) => {
                self.output
                    .println(cards_table(cards, self.overview_chars).to_string());
            }
        }
    }
}

impl Observer for TerminalObserver<'_> {
    fn changed(&mut self, context: SearchContext, state: &SearchState) {
        if context != SearchContext::Overlay || !state.overlay.is_visible() {
            return;
        }
        let panel = state.overlay.panel();
        if self.is_new(panel.view()) {
            self.show(panel.query(), panel.view());
        }
    }

    fn reload(&mut self) {
        self.reloads += 1;
        debug!("watchlist changed during live session");
    }
}

fn view_name(view: &PanelView) -> &'static str {
    match view {
        PanelView::Hint => "hint",
        PanelView::Searching => "searching",
        PanelView::NoResults => "no_results",
        PanelView::Failed => "failed",
        PanelView::Results(_) => "results",
    }
}

fn state_name(state: ControlState) -> &'static str {
    match state {
        ControlState::Ready => "ready",
        ControlState::Pending => "pending",
        ControlState::Done => "done",
    }
}

fn cards_table(cards: &[Card], overview_chars: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("").add_attribute(Attribute::Bold),
        Cell::new("Overview").add_attribute(Attribute::Bold),
    ]);

    for (index, card) in cards.iter().enumerate() {
        let action = match card.state {
            ControlState::Ready => Cell::new(ActionKind::Add.label()),
            ControlState::Pending => Cell::new(ActionKind::Add.pending_label()).fg(Color::Yellow),
            ControlState::Done => Cell::new(ActionKind::Add.done_label()).fg(Color::Green),
        };
        let overview = card
            .result
            .overview
            .as_deref()
            .map(|o| truncate_overview(o, overview_chars))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(title_with_year(&card.result)),
            Cell::new(card.result.media_type.label()),
            action,
            Cell::new(overview),
        ]);
    }
    table
}

pub async fn run_live(context: &Context, output: &Output) -> Result<()> {
    let api = Arc::new(context.client()?);
    let state = SearchState::new(
        OverlaySession::new(context.config.search.debounce()),
        ImportReview::empty(),
    );
    let observer = TerminalObserver::new(output, context.config.search.overview_chars);
    let mut driver = SearchDriver::new(api, state, observer);

    output.info(HELP);
    driver.handle(UiEvent::OpenOverlay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(LiveInput::Query(text)) => driver.handle(UiEvent::Input {
                        context: SearchContext::Overlay,
                        text,
                    }),
                    Ok(LiveInput::Add(n)) => {
                        let control = driver
                            .state()
                            .overlay
                            .panel()
                            .view()
                            .cards()
                            .get(n - 1)
                            .map(|card| card.control);
                        match control {
                            Some(control) => driver.handle(UiEvent::Activate {
                                context: SearchContext::Overlay,
                                control,
                            }),
                            None => output.warn(format!("No result {} on screen", n)),
                        }
                    }
                    Ok(LiveInput::Close) => break,
                    Ok(LiveInput::Help) => output.info(HELP),
                    Err(e) => output.warn(e.to_string()),
                }
            }
            _ = driver.step(), if !driver.is_idle() => {}
        }
    }

    driver.handle(UiEvent::CloseOverlay);
    driver.settle().await;

    let reloads = driver.observer().reloads();
    if output.is_human() {
        if reloads > 0 {
            output.success("Watchlist changed; the page would reload");
        } else {
            output.info("Nothing added; no reload needed");
        }
    } else {
        output.json(&json!({ "type": "closed", "reload": reloads > 0 }));
    }
    Ok(())
}
