use super::{Command, ControlId, SearchContext, SearchPanel};
use crate::debounce::Generation;
use std::fmt;
use std::time::Duration;
use teli_models::SearchResult;
use tracing::{debug, info};

/// The full-screen "add new item" search.
///
/// Whether anything was added is tracked explicitly for the session (reset on
/// open, read on close) and decides whether closing reloads the page.
#[derive(Debug, Clone)]
pub struct OverlaySession {
    panel: SearchPanel,
    visible: bool,
    added_this_session: bool,
}

impl OverlaySession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            panel: SearchPanel::new(SearchContext::Overlay, debounce),
            visible: false,
            added_this_session: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn added_this_session(&self) -> bool {
        self.added_this_session
    }

    pub fn panel(&self) -> &SearchPanel {
        &self.panel
    }

    pub fn open(&mut self) -> Vec<Command> {
        let mut commands = self.panel.reset("");
        self.visible = true;
        self.added_this_session = false;
        commands.push(Command::LockScroll(true));
        commands.push(Command::Focus {
            context: SearchContext::Overlay,
        });
        debug!("overlay opened");
        commands
    }

    /// Hide, clear and unlock scrolling. Reloads once if an add succeeded
    /// since the overlay was opened.
    pub fn close(&mut self) -> Vec<Command> {
        if !self.visible {
            return Vec::new();
        }

        let mut commands = self.panel.reset("");
        self.visible = false;
        commands.push(Command::LockScroll(false));

        if self.added_this_session {
            self.added_this_session = false;
            info!("overlay closed after adding items, reloading");
            commands.push(Command::Reload);
        }
        commands
    }

    pub fn input(&mut self, text: &str) -> Vec<Command> {
        if !self.visible {
            return Vec::new();
        }
        self.panel.input(text)
    }

    pub fn timer_fired(&mut self, generation: Generation) -> Vec<Command> {
        if !self.visible {
            return Vec::new();
        }
        self.panel.timer_fired(generation)
    }

    pub fn results_arrived<E: fmt::Display>(
        &mut self,
        seq: u64,
        result: Result<Vec<SearchResult>, E>,
    ) -> bool {
        self.panel.results_arrived(seq, result)
    }

    pub fn add(&mut self, control: ControlId) -> Vec<Command> {
        if !self.visible {
            return Vec::new();
        }
        self.panel.begin_submit(control).into_iter().collect()
    }

    /// An add finished. If the overlay was already closed by then, the
    /// reload that close would have done happens now.
    pub fn add_finished<E: fmt::Display>(
        &mut self,
        control: ControlId,
        result: Result<(), E>,
    ) -> Vec<Command> {
        let added = self.panel.finish_submit(control, result);
        match added {
            Some(item) if self.visible => {
                info!("added {:?}", item.title);
                self.added_this_session = true;
                Vec::new()
            }
            Some(item) => {
                info!("added {:?} after overlay closed, reloading", item.title);
                vec![Command::Reload]
            }
            None => Vec::new(),
        }
    }
}
