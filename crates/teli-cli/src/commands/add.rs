use super::{ui, Context};
use crate::output::Output;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use serde_json::json;
use teli_client::WatchlistApi;
use teli_models::{AddAck, AddRequest, ListStatus, MediaType, TmdbId};
use tracing::info;

pub fn build_request(
    tmdb_id: &str,
    media_type: &str,
    title: String,
    year: String,
    poster_path: String,
    overview: String,
) -> Result<AddRequest> {
    let tmdb_id = tmdb_id.trim();
    if tmdb_id.is_empty() {
        bail!("TMDB id cannot be empty");
    }
    let media_type = MediaType::parse(media_type)
        .ok_or_else(|| eyre!("Unknown media type {:?}, expected 'movie' or 'tv'", media_type))?;
    if title.trim().is_empty() {
        bail!("Title cannot be empty");
    }

    Ok(AddRequest {
        tmdb_id: TmdbId::new(tmdb_id),
        media_type,
        title,
        year,
        poster_path,
        overview,
    })
}

/// Watchlist section the server put the item in, when it says
pub fn ack_status(ack: &AddAck) -> Option<ListStatus> {
    ack.0
        .get("status")
        .and_then(|s| serde_json::from_value(s.clone()).ok())
}

/// One line describing an acknowledgement, e.g. "Added Inception to Want to Watch"
pub fn describe_ack(title: &str, ack: &AddAck) -> String {
    let mut line = match ack_status(ack) {
        Some(status) => format!("Added {} to {}", title, status.label()),
        None => format!("Added {}", title),
    };
    if let Some(message) = ack.message().filter(|m| !m.trim().is_empty()) {
        line.push_str(&format!(" ({})", message.trim()));
    }
    line
}

pub async fn run_add(context: &Context, request: AddRequest, output: &Output) -> Result<()> {
    let client = context.client()?;
    let spinner = ui::spinner(format!("Adding {}...", request.title));
    let ack = client.add(&request).await;
    spinner.finish_and_clear();

    let ack = ack.map_err(|e| eyre!("Failed to add {}: {}", request.title, e))?;
    info!(tmdb_id = %request.tmdb_id, media_type = %request.media_type, "added to watchlist");

    if output.is_human() {
        output.success(describe_ack(&request.title, &ack));
    } else {
        output.json(&json!({
            "type": "success",
            "request": request,
            "ack": ack,
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_validates_input() {
        let request = build_request(
            " 603 ",
            "Movie",
            "The Matrix".to_string(),
            "1999".to_string(),
            String::new(),
            String::new(),
        )
        .unwrap();
        assert_eq!(request.tmdb_id.as_str(), "603");
        assert_eq!(request.media_type, MediaType::Movie);

        let bad_type = build_request("603", "book", "X".into(), String::new(), String::new(), String::new());
        assert!(bad_type.is_err());
        let no_title = build_request("603", "tv", "  ".into(), String::new(), String::new(), String::new());
        assert!(no_title.is_err());
    }

    #[test]
    fn test_describe_ack() {
        let ack = AddAck(json!({"status": "want", "message": "ok", "list_id": 4}));
        assert_eq!(describe_ack("Dune", &ack), "Added Dune to Want to Watch (ok)");

        let bare = AddAck(json!({}));
        assert_eq!(describe_ack("Dune", &bare), "Added Dune");
        assert_eq!(ack_status(&AddAck(json!({"status": "paused"}))), None);
    }
}
