use super::{Card, Command, ControlId, ControlState, PanelView, SearchContext};
use crate::debounce::{DebounceGate, Generation, RequestSequence};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use teli_models::{AddRequest, SearchResult};
use tracing::{debug, info, warn};

/// Query box plus results area, shared by the overlay and inline rows.
///
/// Owns the debounce gate and request sequence for its context, so several
/// panels can be live at once without interfering.
#[derive(Debug, Clone)]
pub struct SearchPanel {
    context: SearchContext,
    query: String,
    gate: DebounceGate,
    requests: RequestSequence,
    view: PanelView,
    next_control: u32,
    in_flight: HashMap<ControlId, SearchResult>,
}

impl SearchPanel {
    pub fn new(context: SearchContext, debounce: Duration) -> Self {
        Self {
            context,
            query: String::new(),
            gate: DebounceGate::new(debounce),
            requests: RequestSequence::default(),
            view: PanelView::Hint,
            next_control: 0,
            in_flight: HashMap::new(),
        }
    }

    pub fn context(&self) -> SearchContext {
        self.context
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    pub fn is_debouncing(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn card(&self, control: ControlId) -> Option<&Card> {
        self.view.cards().iter().find(|c| c.control == control)
    }

    /// Back to the hint state with `query` in the box. Pending timers and
    /// outstanding searches are dropped; in-flight submissions are kept so
    /// their outcome can still be applied.
    pub fn reset(&mut self, query: &str) -> Vec<Command> {
        self.query = query.to_string();
        self.view = PanelView::Hint;
        self.requests.invalidate();

        let mut commands = Vec::new();
        if self.gate.disarm() {
            commands.push(Command::CancelTimer {
                context: self.context,
            });
        }
        commands
    }

    /// A keystroke: restart the quiet period, or go straight back to the hint
    /// when the box is blank.
    pub fn input(&mut self, text: &str) -> Vec<Command> {
        self.query = text.to_string();

        if text.trim().is_empty() {
            debug!("{}: empty query, clearing results", self.context);
            return self.reset(text);
        }

        let generation = self.gate.arm();
        vec![Command::StartTimer {
            context: self.context,
            generation,
            delay: self.gate.delay(),
        }]
    }

    /// Re-arm the debounce for whatever is in the box, e.g. after prefilling
    pub fn rearm(&mut self) -> Vec<Command> {
        let query = self.query.clone();
        self.input(&query)
    }

    /// The quiet period ended. Issues the search if this is still the latest
    /// timer for the panel.
    pub fn timer_fired(&mut self, generation: Generation) -> Vec<Command> {
        if !self.gate.fire(generation) {
            debug!("{}: ignoring superseded debounce timer {}", self.context, generation);
            return Vec::new();
        }

        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Vec::new();
        }

        let seq = self.requests.next();
        self.view = PanelView::Searching;
        debug!("{}: searching for {:?} (request {})", self.context, query, seq);
        vec![Command::Fetch {
            context: self.context,
            seq,
            query,
        }]
    }

    /// Apply a search response. Returns false when the response was stale
    /// and dropped.
    pub fn results_arrived<E: fmt::Display>(
        &mut self,
        seq: u64,
        result: Result<Vec<SearchResult>, E>,
    ) -> bool {
        if !self.requests.is_latest(seq) {
            debug!("{}: dropping stale response for request {}", self.context, seq);
            return false;
        }

        self.view = match result {
            Ok(results) if results.is_empty() => PanelView::NoResults,
            Ok(results) => {
                info!("{}: {} results", self.context, results.len());
                PanelView::Results(results.into_iter().map(|r| self.make_card(r)).collect())
            }
            Err(e) => {
                warn!("{}: search failed: {}", self.context, e);
                PanelView::Failed
            }
        };
        true
    }

    fn make_card(&mut self, result: SearchResult) -> Card {
        let control = ControlId::new(self.next_control);
        self.next_control += 1;
        Card {
            control,
            request: AddRequest::from(&result),
            result,
            state: ControlState::Ready,
        }
    }

    fn card_mut(&mut self, control: ControlId) -> Option<&mut Card> {
        match &mut self.view {
            PanelView::Results(cards) => cards.iter_mut().find(|c| c.control == control),
            _ => None,
        }
    }

    /// Disable the control and hand back its payload. Returns `None` for an
    /// unknown control, an already-listed result, or a control that is
    /// already pending or done, which is what stops double submissions.
    pub fn begin_submit(&mut self, control: ControlId) -> Option<Command> {
        let context = self.context;
        let card = self.card_mut(control)?;
        if card.state != ControlState::Ready || card.result.on_list {
            debug!("{}: ignoring repeat activation of control {}", context, control);
            return None;
        }

        card.state = ControlState::Pending;
        let request = card.request.clone();
        let result = card.result.clone();
        self.in_flight.insert(control, result);

        Some(Command::Submit {
            context,
            control,
            request,
        })
    }

    /// A submission finished. On success the control shows as done and the
    /// submitted result is returned; on failure the control is ready again.
    pub fn finish_submit<E: fmt::Display>(
        &mut self,
        control: ControlId,
        result: Result<(), E>,
    ) -> Option<SearchResult> {
        let submitted = self.in_flight.remove(&control);
        let context = self.context;

        match result {
            Ok(()) => {
                if let Some(card) = self.card_mut(control) {
                    card.state = ControlState::Done;
                }
                submitted
            }
            Err(e) => {
                warn!("{}: submit of control {} failed: {}", context, control, e);
                if let Some(card) = self.card_mut(control) {
                    card.state = ControlState::Ready;
                }
                None
            }
        }
    }
}
