use super::{ui, Context};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use serde_json::json;
use teli_client::WatchlistApi;
use teli_core::render::{truncate_overview, HINT_NO_RESULTS, HINT_START};
use teli_models::SearchResult;
use tracing::info;

pub async fn run_search(context: &Context, query: &str, output: &Output) -> Result<()> {
    if query.trim().is_empty() {
        output.hint(HINT_START);
        return Ok(());
    }

    let client = context.client()?;
    let spinner = ui::spinner(format!("Searching for \"{}\"...", query.trim()));
    let results = client.search(query).await;
    spinner.finish_and_clear();

    let results = results.map_err(|e| eyre!("Search failed: {}", e))?;
    info!(query = query.trim(), count = results.len(), "search finished");

    if output.is_human() {
        if results.is_empty() {
            output.hint(HINT_NO_RESULTS);
        } else {
            output.println(results_table(&results, context.config.search.overview_chars).to_string());
        }
    } else {
        output.json(&json!({ "results": results }));
    }
    Ok(())
}

/// "Title (Year)", or just the title when the year is unknown
pub fn title_with_year(result: &SearchResult) -> String {
    match result.display_year() {
        Some(year) => format!("{} ({})", result.title, year),
        None => result.title.clone(),
    }
}

/// Numbered result table; the numbers are what `:add N` refers to
pub fn results_table(results: &[SearchResult], overview_chars: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("TMDB").add_attribute(Attribute::Bold),
        Cell::new("List").add_attribute(Attribute::Bold),
        Cell::new("Overview").add_attribute(Attribute::Bold),
    ]);

    for (index, result) in results.iter().enumerate() {
        let listed = match result.listed_id() {
            Some(id) => Cell::new(format!("#{}", id)).fg(Color::Green),
            None if result.on_list => Cell::new("yes").fg(Color::Green),
            None => Cell::new("-"),
        };
        let overview = result
            .overview
            .as_deref()
            .map(|o| truncate_overview(o, overview_chars))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(title_with_year(result)),
            Cell::new(result.media_type.label()),
            Cell::new(result.tmdb_id.as_str()),
            listed,
            Cell::new(overview),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use teli_models::{MediaType, TmdbId};

    fn result(title: &str, year: Option<&str>) -> SearchResult {
        SearchResult {
            tmdb_id: TmdbId::new("27205"),
            media_type: MediaType::Movie,
            title: title.to_string(),
            year: year.map(str::to_string),
            poster_path: None,
            poster_url: None,
            overview: Some("A thief who steals corporate secrets through dreams".to_string()),
            on_list: false,
            list_id: None,
        }
    }

    #[test]
    fn test_title_with_year_skips_blank_year() {
        assert_eq!(title_with_year(&result("Inception", Some("2010"))), "Inception (2010)");
        assert_eq!(title_with_year(&result("Inception", Some(" "))), "Inception");
        assert_eq!(title_with_year(&result("Inception", None)), "Inception");
    }

    #[test]
    fn test_results_table_truncates_overview() {
        let table = results_table(&[result("Inception", Some("2010"))], 10).to_string();
        assert!(table.contains("Inception (2010)"));
        assert!(table.contains("A thief wh..."));
        assert!(!table.contains("corporate"));
    }
}
