use super::Context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::path::Path;
use teli_core::{ActionKind, CardRenderer};
use teli_models::{SearchResponse, SearchResult};

/// A saved `/api/search` response, or just its results array
pub fn parse_results(raw: &str) -> Result<Vec<SearchResult>> {
    if let Ok(response) = serde_json::from_str::<SearchResponse>(raw) {
        return Ok(response.results);
    }
    serde_json::from_str::<Vec<SearchResult>>(raw)
        .map_err(|e| eyre!("Not a search response or result list: {}", e))
}

pub async fn run_render(context: &Context, file: &Path, inline: bool, output: &Output) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
    let results = parse_results(&raw)?;

    let search = &context.config.search;
    let renderer = CardRenderer::new(search.image_base.clone(), search.overview_chars);
    let action = if inline { ActionKind::Select } else { ActionKind::Add };
    let html = renderer.render_results(Some(results.as_slice()), action);

    if output.is_human() {
        output.println(html);
    } else {
        output.json(&json!({ "type": "render", "count": results.len(), "html": html }));
    }
    Ok(())
}
