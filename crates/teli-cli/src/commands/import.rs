use super::search::title_with_year;
use super::{prompts, ui, Context};
use crate::output::Output;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use teli_client::{HttpClient, WatchlistApi};
use teli_core::render::HINT_NO_RESULTS;
use teli_core::widgets::FieldState;
use teli_core::{
    ImportReview, Observer, OverlaySession, PanelView, RowIndex, SearchContext, SearchDriver,
    SearchState, UiEvent,
};
use teli_models::{parse_titles, AddRequest, ImportCandidate, MediaType, TmdbId};
use tracing::{debug, info, warn};

/// The review only reads state back after settling, so nothing is redrawn
struct ReviewObserver;

impl Observer for ReviewObserver {
    fn changed(&mut self, _context: SearchContext, _state: &SearchState) {}

    fn fields_toggled(&mut self, row: RowIndex, fields: FieldState) {
        debug!("row {} fields {:?}", row, fields);
    }

    fn reload(&mut self) {}
}

type ReviewDriver = SearchDriver<HttpClient, ReviewObserver>;

enum RowAction {
    Keep,
    Skip,
    Change,
}

pub async fn run_import(context: &Context, file: &Path, yes: bool, output: &Output) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
    let titles = parse_titles(&raw);
    if titles.is_empty() {
        output.warn(format!("No titles found in {}", file.display()));
        return Ok(());
    }

    let api = Arc::new(context.client()?);
    let candidates = best_matches(api.as_ref(), titles, output).await;

    let state = SearchState::new(
        OverlaySession::new(context.config.search.debounce()),
        ImportReview::new(candidates, context.config.search.debounce()),
    );
    let mut driver = SearchDriver::new(api.clone(), state, ReviewObserver);

    let mut selected = BTreeSet::new();
    if !yes && ui::is_interactive() && output.is_human() {
        output.println(review_table(&driver.state().review).to_string());
        for index in 0..driver.state().review.len() {
            if review_row(&mut driver, index, output).await? {
                selected.insert(index);
            }
        }
    }

    let fields = driver.state().review.form_fields();
    let requests = requests_from_form(&fields)?;
    if requests.is_empty() && selected.is_empty() {
        output.info("Nothing to add");
        return Ok(());
    }

    if !yes
        && ui::is_interactive()
        && output.is_human()
        && !requests.is_empty()
        && !prompts::prompt_yes_no(&format!("Add {} titles to your watchlist?", requests.len()), true)?
    {
        output.info("Import cancelled");
        return Ok(());
    }

    let selected_ids: BTreeSet<String> = selected
        .iter()
        .filter_map(|i| driver.state().review.row(*i))
        .filter_map(|row| row.matched())
        .map(|m| m.tmdb_id.to_string())
        .collect();

    let mut added = Vec::new();
    let mut failed = Vec::new();
    for request in requests {
        if selected_ids.contains(request.tmdb_id.as_str()) {
            added.push(request.title.clone());
            continue;
        }
        match api.add(&request).await {
            Ok(_) => {
                info!(tmdb_id = %request.tmdb_id, "imported");
                added.push(request.title.clone());
            }
            Err(e) => {
                warn!("Import of {} failed: {}", request.title, e);
                failed.push(json!({ "title": request.title, "error": e.to_string() }));
            }
        }
    }

    if output.is_human() {
        output.success(format!("Imported {} titles", added.len()));
        for failure in &failed {
            output.error(format!(
                "{}: {}",
                failure["title"].as_str().unwrap_or_default(),
                failure["error"].as_str().unwrap_or_default()
            ));
        }
    } else {
        output.json(&json!({ "type": "import", "added": added, "failed": failed }));
    }

    if !failed.is_empty() {
        bail!("{} titles could not be added", failed.len());
    }
    Ok(())
}

/// First search result per title; a failed search leaves the row unmatched
async fn best_matches<A: WatchlistApi>(api: &A, titles: Vec<String>, output: &Output) -> Vec<ImportCandidate> {
    let progress = if ui::is_interactive() && output.is_human() {
        let bar = ProgressBar::new(titles.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut candidates = Vec::with_capacity(titles.len());
    for title in titles {
        progress.set_message(title.clone());
        let matched = match api.search(&title).await {
            Ok(results) => results.into_iter().next(),
            Err(e) => {
                warn!("Lookup of {:?} failed: {}", title, e);
                None
            }
        };
        candidates.push(ImportCandidate {
            query: title,
            matched,
        });
        progress.inc(1);
    }
    progress.finish_and_clear();
    candidates
}

fn review_table(review: &ImportReview) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("You wrote").add_attribute(Attribute::Bold),
        Cell::new("Best match").add_attribute(Attribute::Bold),
        Cell::new("Add").add_attribute(Attribute::Bold),
    ]);

    for row in review.rows() {
        let matched = match row.matched() {
            Some(m) if m.on_list => Cell::new(format!("{} (on your list)", title_with_year(m))).fg(Color::Yellow),
            Some(m) => Cell::new(title_with_year(m)),
            None => Cell::new("no match").fg(Color::Red),
        };
        let included = if row.is_included() { "✓" } else { "" };
        table.add_row(vec![
            Cell::new(row.index() + 1),
            Cell::new(row.query()),
            matched,
            Cell::new(included),
        ]);
    }
    table
}

/// Ask about one row. Returns true when a new match was selected, which
/// adds it straight away.
async fn review_row(driver: &mut ReviewDriver, index: RowIndex, output: &Output) -> Result<bool> {
    let Some(row) = driver.state().review.row(index) else {
        return Ok(false);
    };
    let label = match row.matched() {
        Some(m) => format!("{}. {} -> {}", index + 1, row.query(), title_with_year(m)),
        None => format!("{}. {} -> no match", index + 1, row.query()),
    };
    let has_match = row.matched().is_some();
    let included = row.is_included();

    let mut options = Vec::new();
    if has_match {
        options.push(("Keep", RowAction::Keep));
    }
    options.push(("Skip", RowAction::Skip));
    options.push(("Search again", RowAction::Change));
    if has_match && !included {
        options.swap(0, 1);
    }

    let names: Vec<&str> = options.iter().map(|(name, _)| *name).collect();
    let Some(choice) = prompts::prompt_choice(&label, &names)? else {
        return Ok(false);
    };

    match options.get(choice).map(|(_, action)| action) {
        Some(RowAction::Keep) => {
            driver.handle(UiEvent::SetIncluded { row: index, checked: true });
            Ok(false)
        }
        Some(RowAction::Skip) | None => {
            driver.handle(UiEvent::SetIncluded { row: index, checked: false });
            Ok(false)
        }
        Some(RowAction::Change) => change_match(driver, index, output).await,
    }
}

async fn change_match(driver: &mut ReviewDriver, index: RowIndex, output: &Output) -> Result<bool> {
    let pasted = driver
        .state()
        .review
        .row(index)
        .map(|row| row.query().to_string())
        .unwrap_or_default();

    driver.handle(UiEvent::ChangeRow(index));
    let query = prompts::prompt_string("Search for", Some(&pasted))?;
    if query != pasted {
        driver.handle(UiEvent::Input {
            context: SearchContext::Row(index),
            text: query,
        });
    }
    driver.settle().await;

    let context = SearchContext::Row(index);
    let cards = match driver.state().panel(context).map(|p| p.view()) {
        Some(PanelView::Results(cards)) => cards.clone(),
        Some(PanelView::Failed) => {
            output.warn("Search failed, keeping the previous match");
            driver.handle(UiEvent::CloseRow(index));
            return Ok(false);
        }
        _ => {
            output.hint(HINT_NO_RESULTS);
            driver.handle(UiEvent::CloseRow(index));
            return Ok(false);
        }
    };

    let names: Vec<String> = cards
        .iter()
        .map(|card| format!("{} [{}]", title_with_year(&card.result), card.result.media_type.label()))
        .collect();
    let Some(choice) = prompts::prompt_choice("Use which match?", &names)? else {
        driver.handle(UiEvent::CloseRow(index));
        return Ok(false);
    };
    let Some(card) = cards.get(choice) else {
        driver.handle(UiEvent::CloseRow(index));
        return Ok(false);
    };

    driver.handle(UiEvent::Activate {
        context,
        control: card.control,
    });
    driver.settle().await;

    let saved = driver
        .state()
        .review
        .row(index)
        .is_some_and(|row| !row.is_searching());
    if saved {
        output.success(format!("Added {}", title_with_year(&card.result)));
    } else {
        output.error(format!("Could not add {}", card.result.title));
        driver.handle(UiEvent::CloseRow(index));
    }
    Ok(saved)
}

/// Rebuild the add requests from the bulk form's parallel field lists
pub fn requests_from_form(fields: &[(&str, String)]) -> Result<Vec<AddRequest>> {
    let column = |name: &str| -> Vec<&str> {
        fields
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    };

    let ids = column("tmdb_id");
    let types = column("media_type");
    let titles = column("title");
    let years = column("year");
    let posters = column("poster_path");
    let overviews = column("overview");

    let count = ids.len();
    if [&types, &titles, &years, &posters, &overviews]
        .iter()
        .any(|c| c.len() != count)
    {
        bail!("Import form fields are misaligned");
    }

    (0..count)
        .map(|i| {
            let media_type = MediaType::parse(types[i])
                .ok_or_else(|| eyre!("Unknown media type {:?} in import form", types[i]))?;
            Ok(AddRequest {
                tmdb_id: TmdbId::new(ids[i]),
                media_type,
                title: titles[i].to_string(),
                year: years[i].to_string(),
                poster_path: posters[i].to_string(),
                overview: overviews[i].to_string(),
            })
        })
        .collect()
}
