//! tokio driver for [`SearchState`]: runs the debounce timers and the
//! search / add requests the sessions ask for, and feeds their outcomes back.

use crate::debounce::{Generation, TimerSlots};
use crate::search::{Command, ControlId, RowIndex, SearchContext, SearchState, UiEvent};
use crate::widgets::FieldState;
use std::sync::Arc;
use teli_client::{ClientError, WatchlistApi};
use teli_models::SearchResult;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Results of work the driver started
#[derive(Debug)]
enum Completion {
    TimerFired {
        context: SearchContext,
        generation: Generation,
    },
    SearchDone {
        context: SearchContext,
        seq: u64,
        result: Result<Vec<SearchResult>, ClientError>,
    },
    SubmitDone {
        context: SearchContext,
        control: ControlId,
        result: Result<(), ClientError>,
    },
}

/// Receives everything the page would have to redraw or do
pub trait Observer {
    /// The surface for `context` changed and should be redrawn
    fn changed(&mut self, context: SearchContext, state: &SearchState);

    fn focus(&mut self, _context: SearchContext) {}

    fn scroll_locked(&mut self, _locked: bool) {}

    fn fields_toggled(&mut self, _row: RowIndex, _fields: FieldState) {}

    fn reload(&mut self);
}

pub struct SearchDriver<A, O> {
    api: Arc<A>,
    observer: O,
    state: SearchState,
    timers: TimerSlots<SearchContext, JoinHandle<()>>,
    in_flight: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<A, O> SearchDriver<A, O>
where
    A: WatchlistApi + 'static,
    O: Observer,
{
    pub fn new(api: Arc<A>, state: SearchState, observer: O) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            observer,
            state,
            timers: TimerSlots::new(),
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// No timers pending and no requests outstanding
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.in_flight == 0
    }

    /// Apply one user event. Must be called from within a tokio runtime.
    pub fn handle(&mut self, event: UiEvent) {
        debug!("ui event: {:?}", event);
        let (context, commands) = self.state.handle(event);
        self.execute(commands);
        self.observer.changed(context, &self.state);
    }

    /// Wait for the next timer or request to finish and apply it.
    ///
    /// Never returns while nothing is outstanding; check [`is_idle`] first.
    ///
    /// [`is_idle`]: SearchDriver::is_idle
    pub async fn step(&mut self) {
        if let Some(completion) = self.rx.recv().await {
            self.complete(completion);
        }
    }

    /// Run until every pending timer and request has finished
    pub async fn settle(&mut self) {
        while !self.is_idle() {
            self.step().await;
        }
    }

    /// Drive the sessions from `events` until the sender is dropped, then
    /// let outstanding work finish.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UiEvent>) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(completion) = self.rx.recv() => self.complete(completion),
            }
        }
        self.settle().await;
    }

    fn complete(&mut self, completion: Completion) {
        let (context, commands) = match completion {
            Completion::TimerFired {
                context,
                generation,
            } => {
                let commands = self.state.timer_fired(context, generation);
                // A newer timer may already own the slot
                let still_waiting = self
                    .state
                    .panel(context)
                    .is_some_and(|panel| panel.is_debouncing());
                if !still_waiting {
                    self.timers.release(&context);
                }
                (context, commands)
            }
            Completion::SearchDone {
                context,
                seq,
                result,
            } => {
                self.in_flight -= 1;
                if let Err(e) = &result {
                    warn!("{}: search failed: {}", context, e);
                }
                self.state.results_arrived(context, seq, result);
                (context, Vec::new())
            }
            Completion::SubmitDone {
                context,
                control,
                result,
            } => {
                self.in_flight -= 1;
                if let Err(e) = &result {
                    warn!("{}: add failed: {}", context, e);
                }
                (context, self.state.submit_finished(context, control, result))
            }
        };
        self.execute(commands);
        self.observer.changed(context, &self.state);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::StartTimer {
                    context,
                    generation,
                    delay,
                } => {
                    let tx = self.tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Completion::TimerFired {
                            context,
                            generation,
                        });
                    });
                    self.timers.replace(context, handle);
                }
                Command::CancelTimer { context } => {
                    self.timers.cancel(&context);
                }
                Command::Fetch {
                    context,
                    seq,
                    query,
                } => {
                    let api = self.api.clone();
                    let tx = self.tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        let result = api.search(&query).await;
                        let _ = tx.send(Completion::SearchDone {
                            context,
                            seq,
                            result,
                        });
                    });
                }
                Command::Submit {
                    context,
                    control,
                    request,
                } => {
                    let api = self.api.clone();
                    let tx = self.tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        let result = api.add(&request).await.map(|_| ());
                        let _ = tx.send(Completion::SubmitDone {
                            context,
                            control,
                            result,
                        });
                    });
                }
                Command::Focus { context } => self.observer.focus(context),
                Command::LockScroll(locked) => self.observer.scroll_locked(locked),
                Command::SetFields { row, state } => self.observer.fields_toggled(row, state),
                Command::Reload => self.observer.reload(),
            }
        }
    }
}

impl<A, O> Drop for SearchDriver<A, O> {
    fn drop(&mut self) {
        self.timers.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ControlState, ImportReview, OverlaySession, PanelView};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use teli_models::{AddAck, AddRequest, ImportCandidate, MediaType, TmdbId};

    const DEBOUNCE: Duration = Duration::from_millis(400);

    #[derive(Default)]
    struct FakeApi {
        searches: Mutex<Vec<String>>,
        adds: Mutex<Vec<AddRequest>>,
        slow: Mutex<HashMap<String, Duration>>,
        fail_adds: AtomicBool,
        fail_searches: AtomicBool,
    }

    impl FakeApi {
        fn searches(&self) -> Vec<String> {
            self.searches.lock().unwrap().clone()
        }

        fn adds(&self) -> usize {
            self.adds.lock().unwrap().len()
        }
    }

    fn result(id: u64, title: &str) -> SearchResult {
        SearchResult {
            tmdb_id: TmdbId::new(id.to_string()),
            media_type: MediaType::Movie,
            title: title.to_string(),
            year: Some("2021".to_string()),
            poster_path: None,
            poster_url: None,
            overview: None,
            on_list: false,
            list_id: None,
        }
    }

    #[async_trait]
    impl WatchlistApi for FakeApi {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
            self.searches.lock().unwrap().push(query.to_string());
            let delay = self
                .slow
                .lock()
                .unwrap()
                .get(query)
                .copied()
                .unwrap_or(Duration::from_millis(50));
            tokio::time::sleep(delay).await;
            if self.fail_searches.load(Ordering::SeqCst) {
                return Err(ClientError::new("connection refused"));
            }
            Ok(vec![result(1, query), result(2, &format!("{} II", query))])
        }

        async fn add(&self, request: &AddRequest) -> Result<AddAck, ClientError> {
            self.adds.lock().unwrap().push(request.clone());
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail_adds.load(Ordering::SeqCst) {
                return Err(ClientError::new("connection reset"));
            }
            Ok(AddAck(serde_json::json!({"message": "Added"})))
        }
    }

    #[derive(Default)]
    struct Recorder {
        reloads: usize,
        scroll_locked: bool,
        focused: Vec<SearchContext>,
        toggled: Vec<(RowIndex, FieldState)>,
    }

    impl Observer for Recorder {
        fn changed(&mut self, _context: SearchContext, _state: &SearchState) {}

        fn focus(&mut self, context: SearchContext) {
            self.focused.push(context);
        }

        fn scroll_locked(&mut self, locked: bool) {
            self.scroll_locked = locked;
        }

        fn fields_toggled(&mut self, row: RowIndex, fields: FieldState) {
            self.toggled.push((row, fields));
        }

        fn reload(&mut self) {
            self.reloads += 1;
        }
    }

    fn overlay_driver(api: Arc<FakeApi>) -> SearchDriver<FakeApi, Recorder> {
        let state = SearchState::new(OverlaySession::new(DEBOUNCE), ImportReview::empty());
        SearchDriver::new(api, state, Recorder::default())
    }

    fn type_text(driver: &mut SearchDriver<FakeApi, Recorder>, context: SearchContext, text: &str) {
        driver.handle(UiEvent::Input {
            context,
            text: text.to_string(),
        });
    }

    fn first_control(driver: &SearchDriver<FakeApi, Recorder>) -> ControlId {
        driver.state().overlay.panel().view().cards()[0].control
    }

    async fn search_for(driver: &mut SearchDriver<FakeApi, Recorder>, text: &str) {
        type_text(driver, SearchContext::Overlay, text);
        driver.settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_query_fetches_once_trimmed() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);
        assert!(driver.observer().scroll_locked);

        search_for(&mut driver, "  dune part two ").await;

        assert_eq!(api.searches(), vec!["dune part two"]);
        assert_eq!(driver.state().overlay.panel().view().cards().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_inside_window_fetch_only_last() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);

        for text in ["a", "al", "ali", "alie", "alien"] {
            type_text(&mut driver, SearchContext::Overlay, text);
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        assert!(api.searches().is_empty(), "no timer fired while typing");

        driver.settle().await;
        assert_eq!(api.searches(), vec!["alien"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_the_box_cancels_the_search() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);

        type_text(&mut driver, SearchContext::Overlay, "heat");
        type_text(&mut driver, SearchContext::Overlay, "   ");
        assert!(driver.is_idle());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.searches().is_empty());
        assert_eq!(driver.state().overlay.panel().view(), &PanelView::Hint);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_dropped() {
        let api = Arc::new(FakeApi::default());
        api.slow
            .lock()
            .unwrap()
            .insert("star".to_string(), Duration::from_secs(2));
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);

        type_text(&mut driver, SearchContext::Overlay, "star");
        tokio::time::sleep(Duration::from_millis(450)).await;
        driver.step().await;
        type_text(&mut driver, SearchContext::Overlay, "star wars");
        driver.settle().await;

        assert_eq!(api.searches(), vec!["star", "star wars"]);
        let titles: Vec<_> = driver
            .state()
            .overlay
            .panel()
            .view()
            .cards()
            .iter()
            .map(|c| c.result.title.clone())
            .collect();
        assert_eq!(titles, vec!["star wars", "star wars II"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_shows_failed_hint() {
        let api = Arc::new(FakeApi::default());
        api.fail_searches.store(true, Ordering::SeqCst);
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);

        search_for(&mut driver, "heat").await;
        assert_eq!(driver.state().overlay.panel().view(), &PanelView::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_click_posts_once() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);
        search_for(&mut driver, "heat").await;

        let control = first_control(&driver);
        for _ in 0..2 {
            driver.handle(UiEvent::Activate {
                context: SearchContext::Overlay,
                control,
            });
        }
        driver.settle().await;

        assert_eq!(api.adds(), 1);
        let card = driver.state().overlay.panel().card(control).unwrap();
        assert_eq!(card.state, ControlState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_add_restores_control() {
        let api = Arc::new(FakeApi::default());
        api.fail_adds.store(true, Ordering::SeqCst);
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);
        search_for(&mut driver, "heat").await;

        let control = first_control(&driver);
        driver.handle(UiEvent::Activate {
            context: SearchContext::Overlay,
            control,
        });
        driver.settle().await;

        let card = driver.state().overlay.panel().card(control).unwrap();
        assert_eq!(card.state, ControlState::Ready);

        driver.handle(UiEvent::CloseOverlay);
        assert_eq!(driver.observer().reloads, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_reloads_once_after_add() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());

        driver.handle(UiEvent::OpenOverlay);
        driver.handle(UiEvent::Escape);
        assert_eq!(driver.observer().reloads, 0);

        driver.handle(UiEvent::OpenOverlay);
        search_for(&mut driver, "heat").await;
        let control = first_control(&driver);
        driver.handle(UiEvent::Activate {
            context: SearchContext::Overlay,
            control,
        });
        driver.settle().await;

        driver.handle(UiEvent::CloseOverlay);
        driver.handle(UiEvent::CloseOverlay);
        assert_eq!(driver.observer().reloads, 1);
        assert!(!driver.observer().scroll_locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_finishing_after_close_reloads() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());
        driver.handle(UiEvent::OpenOverlay);
        search_for(&mut driver, "heat").await;

        let control = first_control(&driver);
        driver.handle(UiEvent::Activate {
            context: SearchContext::Overlay,
            control,
        });
        driver.handle(UiEvent::CloseOverlay);
        assert_eq!(driver.observer().reloads, 0);

        driver.settle().await;
        assert_eq!(driver.observer().reloads, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inline_rows_debounce_independently() {
        let api = Arc::new(FakeApi::default());
        let candidates = vec![
            ImportCandidate {
                query: "Heat".to_string(),
                matched: Some(result(949, "Heat")),
            },
            ImportCandidate {
                query: "Ronin".to_string(),
                matched: None,
            },
        ];
        let state = SearchState::new(
            OverlaySession::new(DEBOUNCE),
            ImportReview::new(candidates, DEBOUNCE),
        );
        let mut driver = SearchDriver::new(api.clone(), state, Recorder::default());

        driver.handle(UiEvent::ChangeRow(0));
        driver.handle(UiEvent::ChangeRow(1));
        assert_eq!(
            driver.observer().focused,
            vec![SearchContext::Row(0), SearchContext::Row(1)]
        );
        driver.settle().await;

        let mut searched = api.searches();
        searched.sort();
        assert_eq!(searched, vec!["Heat", "Ronin"]);

        let control = driver.state().review.row(1).unwrap().panel().view().cards()[0].control;
        driver.handle(UiEvent::Activate {
            context: SearchContext::Row(1),
            control,
        });
        driver.settle().await;

        let row = driver.state().review.row(1).unwrap();
        assert_eq!(row.matched().unwrap().title, "Ronin");
        assert!(row.is_included());
        assert!(!row.is_searching());
        assert_eq!(driver.observer().toggled, vec![(1, FieldState::Enabled)]);

        driver.handle(UiEvent::SetIncluded {
            row: 0,
            checked: false,
        });
        assert_eq!(
            driver.observer().toggled,
            vec![(1, FieldState::Enabled), (0, FieldState::Disabled)]
        );
        assert_eq!(driver.observer().reloads, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drains_after_events_close() {
        let api = Arc::new(FakeApi::default());
        let mut driver = overlay_driver(api.clone());
        let (tx, rx) = mpsc::channel(8);

        tx.send(UiEvent::OpenOverlay).await.unwrap();
        tx.send(UiEvent::Input {
            context: SearchContext::Overlay,
            text: "heat".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        driver.run(rx).await;
        assert_eq!(api.searches(), vec!["heat"]);
        assert!(driver.is_idle());
    }
}
