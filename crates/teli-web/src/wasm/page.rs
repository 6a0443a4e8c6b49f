use super::{describe, fetch, log, warn};
use crate::dom::{self, ClickHit};
use crate::PageConfig;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use teli_core::debounce::{Generation, TimerHandle, TimerSlots};
use teli_core::render::{ActionKind, CardRenderer};
use teli_core::search::{
    Command, ImportReview, OverlaySession, SearchContext, SearchState, UiEvent,
};
use teli_core::widgets::{
    active_tab, field_state, tab_links, ClickTarget, FieldState, FlashCategory, FlashTimeline,
    ProfileDropdown,
};
use teli_models::{ImportCandidate, SearchResult};
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, KeyboardEvent,
    MouseEvent, Window,
};

pub(crate) fn init(window: Window) -> Result<(), JsValue> {
    let document = window.document().ok_or("No document")?;

    let raw = document
        .body()
        .and_then(|body| body.get_attribute(dom::CONFIG_ATTR));
    let (config, error) = PageConfig::from_attribute(raw.as_deref());
    if let Some(error) = error {
        warn(&format!("teli: ignoring unreadable page config: {}", error));
    }

    init_dropdown(&document)?;
    init_flashes(&window, &document, config.flash_timeline())?;
    highlight_tabs(&window, &document)?;
    SearchPage::init(window.clone(), document, &config)?;
    register_worker(&window, &config);
    Ok(())
}

fn millis(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

fn listen<E: FromWasmAbi + 'static>(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// ──────────────────────────────────────────────────────────────────────────────
// Static widgets
// ──────────────────────────────────────────────────────────────────────────────

fn init_dropdown(document: &Document) -> Result<(), JsValue> {
    let (Some(button), Some(menu)) = (
        document.get_element_by_id(dom::PROFILE_BUTTON),
        document.get_element_by_id(dom::PROFILE_MENU),
    ) else {
        return Ok(());
    };

    let dropdown = Rc::new(RefCell::new(ProfileDropdown::new()));
    let show = |menu: &Element, open: bool| {
        let _ = menu.class_list().toggle_with_force(dom::OPEN_CLASS, open);
    };

    {
        let dropdown = dropdown.clone();
        let menu = menu.clone();
        listen(&button, "click", move |event: MouseEvent| {
            event.stop_propagation();
            show(&menu, dropdown.borrow_mut().click(ClickTarget::Activator));
        })?;
    }
    {
        let dropdown = dropdown.clone();
        listen(&menu, "click", move |event: MouseEvent| {
            event.stop_propagation();
            dropdown.borrow_mut().click(ClickTarget::Menu);
        })?;
    }
    {
        let dropdown = dropdown.clone();
        let menu = menu.clone();
        listen(document, "click", move |_: MouseEvent| {
            show(&menu, dropdown.borrow_mut().click(ClickTarget::Outside));
        })?;
    }
    listen(document, "keydown", move |event: KeyboardEvent| {
        if event.key() == "Escape" {
            show(&menu, dropdown.borrow_mut().escape());
        }
    })
}

fn init_flashes(window: &Window, document: &Document, timeline: FlashTimeline) -> Result<(), JsValue> {
    let flashes = document.query_selector_all(dom::FLASH_SELECTOR)?;
    for i in 0..flashes.length() {
        let Some(flash) = flashes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
            continue;
        };
        let category = flash.get_attribute(dom::FLASH_CATEGORY_ATTR);
        if let Some(category) = FlashCategory::from_attribute(category.as_deref()) {
            flash.class_list().add_1(category.class())?;
        }
        schedule_flash(window, flash, timeline)?;
    }
    Ok(())
}

/// Fade after the dismiss delay, then remove once the fade has run
fn schedule_flash(window: &Window, flash: HtmlElement, timeline: FlashTimeline) -> Result<(), JsValue> {
    let [(dismiss_after, _), (fade, _)] = timeline.steps();
    let later = window.clone();

    let fade_out = Closure::once_into_js(move || {
        let style = flash.style();
        let _ = style.set_property("transition", &timeline.transition());
        let _ = style.set_property("opacity", "0");

        let remove = Closure::once_into_js(move || flash.remove());
        let _ = later.set_timeout_with_callback_and_timeout_and_arguments_0(
            remove.unchecked_ref(),
            millis(fade),
        );
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        fade_out.unchecked_ref(),
        millis(dismiss_after),
    )?;
    Ok(())
}

fn highlight_tabs(window: &Window, document: &Document) -> Result<(), JsValue> {
    let nodes = document.query_selector_all(dom::TAB_SELECTOR)?;
    let tabs: Vec<Element> = (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.dyn_into::<Element>().ok())
        .collect();
    if tabs.is_empty() {
        return Ok(());
    }

    let hrefs: Vec<String> = tabs
        .iter()
        .map(|tab| tab.get_attribute("href").unwrap_or_default())
        .collect();
    let location = window.location().href()?;
    let active = active_tab(&hrefs, &location);

    for (i, (tab, href)) in tabs.iter().zip(tab_links(&hrefs, &location)).enumerate() {
        tab.set_attribute("href", &href)?;
        tab.class_list()
            .toggle_with_force(dom::ACTIVE_CLASS, Some(i) == active)?;
    }
    Ok(())
}

fn register_worker(window: &Window, config: &PageConfig) {
    let url = config.worker_url();
    let registration = window.navigator().service_worker().register(&url);
    spawn_local(async move {
        // Without a worker the app is simply network-only
        if let Err(e) = wasm_bindgen_futures::JsFuture::from(registration).await {
            log(&format!("teli: service worker not registered: {}", describe(&e)));
        }
    });
}

// ──────────────────────────────────────────────────────────────────────────────
// Search surfaces
// ──────────────────────────────────────────────────────────────────────────────

struct Timeout {
    window: Window,
    id: i32,
}

impl TimerHandle for Timeout {
    fn cancel(self) {
        self.window.clear_timeout_with_handle(self.id);
    }
}

/// The overlay and import rows of one page, driven by browser timers and
/// `fetch`. Everything runs on the page's event loop, so a `RefCell` is
/// enough; borrows never span an await.
struct SearchPage {
    window: Window,
    document: Document,
    state: SearchState,
    timers: TimerSlots<SearchContext, Timeout>,
    renderer: CardRenderer,
}

type Shared = Rc<RefCell<SearchPage>>;

impl SearchPage {
    fn init(window: Window, document: Document, config: &PageConfig) -> Result<(), JsValue> {
        let review = match read_candidates(&document) {
            Some(candidates) => ImportReview::new(candidates, config.debounce()),
            None => ImportReview::empty(),
        };
        let has_overlay = document.get_element_by_id(dom::SEARCH_OVERLAY).is_some();
        if !has_overlay && review.is_empty() && !has_include_boxes(&document)? {
            return Ok(());
        }

        let page: Shared = Rc::new(RefCell::new(SearchPage {
            window,
            document: document.clone(),
            state: SearchState::new(OverlaySession::new(config.debounce()), review),
            timers: TimerSlots::new(),
            renderer: config.renderer(),
        }));

        {
            let page = page.clone();
            listen(&document, "click", move |event: MouseEvent| {
                if let Some(event) = event.target().and_then(|t| click_target(&t)) {
                    dispatch(&page, event);
                }
            })?;
        }
        {
            let page = page.clone();
            listen(&document, "input", move |event: Event| {
                let Some(input) = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                else {
                    return;
                };
                if let Some(context) = dom::input_context(&input.id()) {
                    dispatch(
                        &page,
                        UiEvent::Input {
                            context,
                            text: input.value(),
                        },
                    );
                }
            })?;
        }
        {
            let page = page.clone();
            listen(&document, "change", move |event: Event| {
                let Some(input) = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                else {
                    return;
                };
                if input.matches(dom::INCLUDE_SELECTOR).unwrap_or(false) {
                    toggle_row(&page, &input);
                }
            })?;
        }
        {
            let page = page.clone();
            listen(&document, "keydown", move |event: KeyboardEvent| {
                if let Some(event) = dom::key_event(&event.key()) {
                    dispatch(&page, event);
                }
            })?;
        }

        // Line the hidden fields up with each checkbox's initial state
        let boxes = document.query_selector_all(dom::INCLUDE_SELECTOR)?;
        for i in 0..boxes.length() {
            if let Some(input) = boxes.item(i).and_then(|n| n.dyn_into::<HtmlInputElement>().ok()) {
                toggle_row(&page, &input);
            }
        }
        Ok(())
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn input_id(context: SearchContext) -> String {
        match context {
            SearchContext::Overlay => dom::SEARCH_INPUT.to_string(),
            SearchContext::Row(row) => dom::row_id(dom::ROW_INPUT_PREFIX, row),
        }
    }

    fn render(&self, context: SearchContext) {
        match context {
            SearchContext::Overlay => {
                let overlay = &self.state.overlay;
                if let Some(element) = self.element(dom::SEARCH_OVERLAY) {
                    let _ = element
                        .class_list()
                        .toggle_with_force(dom::HIDDEN_CLASS, !overlay.is_visible());
                }
                self.sync_input(context, overlay.panel().query());
                if let Some(results) = self.element(dom::SEARCH_RESULTS) {
                    results.set_inner_html(
                        &self.renderer.render_panel(overlay.panel().view(), ActionKind::Add),
                    );
                }
            }
            SearchContext::Row(index) => {
                let Some(row) = self.state.review.row(index) else {
                    return;
                };
                if let Some(panel) = self.element(&dom::row_id(dom::ROW_PANEL_PREFIX, index)) {
                    let _ = panel
                        .class_list()
                        .toggle_with_force(dom::HIDDEN_CLASS, !row.is_searching());
                }
                self.sync_input(context, row.panel().query());
                if let Some(results) = self.element(&dom::row_id(dom::ROW_RESULTS_PREFIX, index)) {
                    results.set_inner_html(
                        &self.renderer.render_panel(row.panel().view(), ActionKind::Select),
                    );
                }

                let candidate = ImportCandidate {
                    query: row.query().to_string(),
                    matched: row.matched().cloned(),
                };
                if let Some(display) = self.element(&dom::row_id(dom::ROW_MATCH_PREFIX, index)) {
                    display.set_inner_html(&self.renderer.render_row_match(index, &candidate));
                }
                if let Some(fields) = self.element(&dom::row_id(dom::ROW_FIELDS_PREFIX, index)) {
                    let hidden = row.hidden_fields().unwrap_or_default();
                    fields.set_inner_html(&self.renderer.render_row_fields(
                        index,
                        &hidden,
                        row.fields().is_disabled(),
                    ));
                }
            }
        }
    }

    /// Only writes when the box disagrees, so typing is never disturbed
    fn sync_input(&self, context: SearchContext, query: &str) {
        let input = self
            .element(&Self::input_id(context))
            .and_then(|e| e.dyn_into::<HtmlInputElement>().ok());
        if let Some(input) = input {
            if input.value() != query {
                input.set_value(query);
            }
        }
    }

    fn focus(&self, context: SearchContext) {
        let input = self
            .element(&Self::input_id(context))
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());
        if let Some(input) = input {
            let _ = input.focus();
        }
    }

    fn lock_scroll(&self, locked: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let style = body.style();
        let _ = if locked {
            style.set_property("overflow", "hidden")
        } else {
            style.remove_property("overflow").map(|_| ())
        };
    }

    fn set_fields(&self, row: usize, state: FieldState) {
        let selector = format!("#{} input", dom::row_id(dom::ROW_FIELDS_PREFIX, row));
        if let Ok(inputs) = self.document.query_selector_all(&selector) {
            for i in 0..inputs.length() {
                if let Some(input) = inputs.item(i).and_then(|n| n.dyn_into::<HtmlInputElement>().ok()) {
                    input.set_disabled(state.is_disabled());
                }
            }
        }

        let checkbox = format!("{}[{}=\"{}\"]", dom::INCLUDE_SELECTOR, dom::ROW_ATTR, row);
        if let Ok(Some(checkbox)) = self.document.query_selector(&checkbox) {
            if let Ok(checkbox) = checkbox.dyn_into::<HtmlInputElement>() {
                checkbox.set_checked(!state.is_disabled());
            }
        }
    }
}

fn has_include_boxes(document: &Document) -> Result<bool, JsValue> {
    Ok(document.query_selector(dom::INCLUDE_SELECTOR)?.is_some())
}

fn read_candidates(document: &Document) -> Option<Vec<ImportCandidate>> {
    let raw = document
        .get_element_by_id(dom::IMPORT_CANDIDATES)?
        .text_content()?;
    match serde_json::from_str(&raw) {
        Ok(candidates) => Some(candidates),
        Err(e) => {
            warn(&format!("teli: unreadable import candidates: {}", e));
            None
        }
    }
}

/// Resolve a click to the nearest element the search surfaces care about
fn click_target(target: &EventTarget) -> Option<UiEvent> {
    let element = target.dyn_ref::<Element>()?;
    let closest = |selector: &str| element.closest(selector).ok().flatten();

    if let Some(control) = closest(dom::CONTROL_SELECTOR) {
        let id = control.get_attribute(dom::CONTROL_ATTR)?;
        let row = control
            .closest(dom::ROW_RESULTS_SELECTOR)
            .ok()
            .flatten()
            .and_then(|results| results.get_attribute(dom::ROW_ATTR));
        return dom::click_event(ClickHit::Control {
            control: &id,
            row: row.as_deref(),
        });
    }
    if let Some(button) = closest(dom::CHANGE_SELECTOR) {
        let row = button.get_attribute(dom::ROW_ATTR)?;
        return dom::click_event(ClickHit::ChangeRow(&row));
    }
    if let Some(button) = closest(dom::ROW_CLOSE_SELECTOR) {
        let row = button.get_attribute(dom::ROW_ATTR)?;
        return dom::click_event(ClickHit::CloseRow(&row));
    }
    if closest(dom::SEARCH_OPEN_SELECTOR).is_some() {
        return dom::click_event(ClickHit::OpenSearch);
    }
    if closest(&format!("#{}", dom::SEARCH_CLOSE)).is_some() {
        return dom::click_event(ClickHit::CloseSearch);
    }
    None
}

fn toggle_row(page: &Shared, checkbox: &HtmlInputElement) {
    let Some(row) = checkbox
        .get_attribute(dom::ROW_ATTR)
        .as_deref()
        .and_then(dom::parse_row)
    else {
        return;
    };
    let checked = checkbox.checked();

    let known = page.borrow().state.review.row(row).is_some();
    if known {
        dispatch(page, UiEvent::SetIncluded { row, checked });
    } else {
        // Markup without embedded candidates: the checkbox alone decides
        page.borrow().set_fields(row, field_state(checked));
    }
}

fn dispatch(page: &Shared, event: UiEvent) {
    let (context, commands) = page.borrow_mut().state.handle(event);
    execute(page, commands);
    page.borrow().render(context);
}

fn execute(page: &Shared, commands: Vec<Command>) {
    for command in commands {
        match command {
            Command::StartTimer {
                context,
                generation,
                delay,
            } => start_timer(page, context, generation, delay),
            Command::CancelTimer { context } => {
                page.borrow_mut().timers.cancel(&context);
            }
            Command::Fetch {
                context,
                seq,
                query,
            } => {
                let page = page.clone();
                let window = page.borrow().window.clone();
                spawn_local(async move {
                    let result = fetch::search(&window, &query).await;
                    on_results(&page, context, seq, result);
                });
            }
            Command::Submit {
                context,
                control,
                request,
            } => {
                let page = page.clone();
                let window = page.borrow().window.clone();
                spawn_local(async move {
                    let result = fetch::add(&window, &request).await.map(|_| ());
                    if let Err(e) = &result {
                        warn(&format!("teli: add failed: {}", e));
                    }
                    let commands = page
                        .borrow_mut()
                        .state
                        .submit_finished(context, control, result);
                    execute(&page, commands);
                    page.borrow().render(context);
                });
            }
            Command::Focus { context } => page.borrow().focus(context),
            Command::LockScroll(locked) => page.borrow().lock_scroll(locked),
            Command::SetFields { row, state } => page.borrow().set_fields(row, state),
            Command::Reload => {
                if let Err(e) = page.borrow().window.location().reload() {
                    warn(&format!("teli: reload failed: {}", describe(&e)));
                }
            }
        }
    }
}

fn start_timer(page: &Shared, context: SearchContext, generation: Generation, delay: Duration) {
    let window = page.borrow().window.clone();
    let fired = {
        let page = page.clone();
        Closure::once_into_js(move || on_timer(&page, context, generation))
    };
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(fired.unchecked_ref(), millis(delay)) {
        Ok(id) => page.borrow_mut().timers.replace(context, Timeout { window, id }),
        Err(e) => warn(&format!("teli: could not start timer: {}", describe(&e))),
    }
}

fn on_timer(page: &Shared, context: SearchContext, generation: Generation) {
    let commands = {
        let mut page = page.borrow_mut();
        let commands = page.state.timer_fired(context, generation);
        let still_waiting = page
            .state
            .panel(context)
            .is_some_and(|panel| panel.is_debouncing());
        if !still_waiting {
            page.timers.release(&context);
        }
        commands
    };
    execute(page, commands);
    page.borrow().render(context);
}

fn on_results(page: &Shared, context: SearchContext, seq: u64, result: Result<Vec<SearchResult>, String>) {
    if let Err(e) = &result {
        warn(&format!("teli: search failed: {}", e));
    }
    let applied = page.borrow_mut().state.results_arrived(context, seq, result);
    if applied {
        page.borrow().render(context);
    }
}
