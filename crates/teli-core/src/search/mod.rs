//! Live search: the full-screen overlay for adding new items and the inline
//! "change match" panels on the import review page.
//!
//! Both are sans-IO state machines. Every operation mutates session state and
//! returns the [`Command`]s a driver has to carry out (start or cancel a
//! timer, issue a request, lock scrolling, reload). Drivers report timer and
//! request completions back with the generation or sequence number they were
//! given, and the session drops anything that is no longer current.

pub mod inline;
pub mod overlay;
pub mod panel;

pub use inline::{ImportReview, ImportRow};
pub use overlay::OverlaySession;
pub use panel::SearchPanel;

use crate::debounce::Generation;
use crate::widgets::FieldState;
use std::fmt;
use std::time::Duration;
use teli_models::{AddRequest, SearchResult};

pub type RowIndex = usize;

/// Which search surface an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchContext {
    Overlay,
    Row(RowIndex),
}

impl fmt::Display for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchContext::Overlay => f.write_str("overlay"),
            SearchContext::Row(index) => write!(f, "row-{}", index),
        }
    }
}

/// Opaque handle tying a rendered action control to its typed payload.
///
/// Ids are never reused within a session, so a click on a control from an
/// older render cannot resolve to a newer card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u32);

impl ControlId {
    pub fn new(id: u32) -> Self {
        ControlId(id)
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse().ok().map(ControlId)
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Clickable, original label
    Ready,
    /// Request in flight, control disabled
    Pending,
    /// Request succeeded, control replaced by a done indicator
    Done,
}

/// One rendered result with its action payload
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub control: ControlId,
    pub result: SearchResult,
    pub request: AddRequest,
    pub state: ControlState,
}

/// What the results area of a surface currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    Hint,
    Searching,
    NoResults,
    Failed,
    Results(Vec<Card>),
}

impl PanelView {
    pub fn cards(&self) -> &[Card] {
        match self {
            PanelView::Results(cards) => cards,
            _ => &[],
        }
    }
}

/// Side effects requested by a session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartTimer {
        context: SearchContext,
        generation: Generation,
        delay: Duration,
    },
    CancelTimer {
        context: SearchContext,
    },
    Fetch {
        context: SearchContext,
        seq: u64,
        query: String,
    },
    Submit {
        context: SearchContext,
        control: ControlId,
        request: AddRequest,
    },
    Focus {
        context: SearchContext,
    },
    LockScroll(bool),
    /// Enable or disable an import row's hidden fields
    SetFields {
        row: RowIndex,
        state: FieldState,
    },
    Reload,
}

/// User interaction with a search surface
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    OpenOverlay,
    CloseOverlay,
    /// Escape pressed anywhere on the page
    Escape,
    Input {
        context: SearchContext,
        text: String,
    },
    Activate {
        context: SearchContext,
        control: ControlId,
    },
    ChangeRow(RowIndex),
    CloseRow(RowIndex),
    SetIncluded {
        row: RowIndex,
        checked: bool,
    },
}

/// Every search surface on a page
pub struct SearchState {
    pub overlay: OverlaySession,
    pub review: ImportReview,
}

impl SearchState {
    pub fn new(overlay: OverlaySession, review: ImportReview) -> Self {
        Self { overlay, review }
    }

    /// Apply one user event. Returns the surface it touched and the commands
    /// to carry out.
    pub fn handle(&mut self, event: UiEvent) -> (SearchContext, Vec<Command>) {
        match event {
            UiEvent::OpenOverlay => (SearchContext::Overlay, self.overlay.open()),
            UiEvent::CloseOverlay | UiEvent::Escape => (SearchContext::Overlay, self.overlay.close()),
            UiEvent::Input { context, text } => (context, self.input(context, &text)),
            UiEvent::Activate { context, control } => (context, self.activate(context, control)),
            UiEvent::ChangeRow(row) => (SearchContext::Row(row), self.review.change(row)),
            UiEvent::CloseRow(row) => (SearchContext::Row(row), self.review.close(row)),
            UiEvent::SetIncluded { row, checked } => {
                let state = self.review.set_included(row, checked);
                (SearchContext::Row(row), vec![Command::SetFields { row, state }])
            }
        }
    }

    pub fn input(&mut self, context: SearchContext, text: &str) -> Vec<Command> {
        match context {
            SearchContext::Overlay => self.overlay.input(text),
            SearchContext::Row(index) => self.review.input(index, text),
        }
    }

    pub fn timer_fired(&mut self, context: SearchContext, generation: Generation) -> Vec<Command> {
        match context {
            SearchContext::Overlay => self.overlay.timer_fired(generation),
            SearchContext::Row(index) => self.review.timer_fired(index, generation),
        }
    }

    pub fn results_arrived<E: fmt::Display>(
        &mut self,
        context: SearchContext,
        seq: u64,
        result: Result<Vec<SearchResult>, E>,
    ) -> bool {
        match context {
            SearchContext::Overlay => self.overlay.results_arrived(seq, result),
            SearchContext::Row(index) => self.review.results_arrived(index, seq, result),
        }
    }

    /// Add (overlay) or select (inline row) the result behind a control
    pub fn activate(&mut self, context: SearchContext, control: ControlId) -> Vec<Command> {
        match context {
            SearchContext::Overlay => self.overlay.add(control),
            SearchContext::Row(index) => self.review.select(index, control),
        }
    }

    pub fn submit_finished<E: fmt::Display>(
        &mut self,
        context: SearchContext,
        control: ControlId,
        result: Result<(), E>,
    ) -> Vec<Command> {
        match context {
            SearchContext::Overlay => self.overlay.add_finished(control, result),
            SearchContext::Row(index) => self.review.select_finished(index, control, result),
        }
    }

    pub fn close(&mut self, context: SearchContext) -> Vec<Command> {
        match context {
            SearchContext::Overlay => self.overlay.close(),
            SearchContext::Row(index) => self.review.close(index),
        }
    }

    pub fn panel(&self, context: SearchContext) -> Option<&SearchPanel> {
        match context {
            SearchContext::Overlay => Some(self.overlay.panel()),
            SearchContext::Row(index) => self.review.row(index).map(ImportRow::panel),
        }
    }
}
