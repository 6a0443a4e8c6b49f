use super::*;
use crate::search::ControlId;
use teli_models::{MediaType, TmdbId};

fn result(title: &str) -> SearchResult {
    SearchResult {
        tmdb_id: TmdbId::new("27205"),
        media_type: MediaType::Movie,
        title: title.to_string(),
        year: Some("2010".to_string()),
        poster_path: None,
        poster_url: Some("https://img.example/p.jpg".to_string()),
        overview: Some("A thief who steals corporate secrets.".to_string()),
        on_list: false,
        list_id: None,
    }
}

fn card(result: SearchResult, state: ControlState) -> Card {
    Card {
        control: ControlId::new(7),
        request: AddRequest::from(&result),
        result,
        state,
    }
}

#[test]
fn test_empty_or_missing_results_render_hint() {
    let renderer = CardRenderer::default();
    for markup in [
        renderer.render_results(None, ActionKind::Add),
        renderer.render_results(Some(&[]), ActionKind::Add),
    ] {
        assert!(markup.contains(HINT_NO_RESULTS));
        assert!(!markup.contains("search-result"));
    }
}

#[test]
fn test_card_contents() {
    let renderer = CardRenderer::default();
    let markup = renderer.render_results(Some(&[result("Inception")]), ActionKind::Add);
    assert!(markup.contains(r#"src="https://img.example/p.jpg""#));
    assert!(markup.contains(r#"Inception <span class="search-year">(2010)</span>"#));
    assert!(markup.contains(r#"<span class="badge badge-movie">Movie</span>"#));
    assert!(markup.contains(r#"data-control="0">+ Add</button>"#));
    assert_eq!(markup.matches("search-result\"").count(), 1);
}

#[test]
fn test_tv_badge_and_missing_year() {
    let renderer = CardRenderer::default();
    let mut show = result("The Wire");
    show.media_type = MediaType::Tv;
    show.year = Some(String::new());
    let markup = renderer.render_results(Some(&[show]), ActionKind::Add);
    assert!(markup.contains("TV Show"));
    assert!(!markup.contains("search-year"));
}

#[test]
fn test_listed_result_links_to_detail() {
    let renderer = CardRenderer::default();
    let mut listed = result("Inception");
    listed.on_list = true;
    listed.list_id = Some(42);
    let markup = renderer.render_results(Some(&[listed]), ActionKind::Add);
    assert!(markup.contains(r#"href="/detail/42""#));
    assert!(!markup.contains("search-add-btn"));
    assert!(!markup.contains("<button"));
}

#[test]
fn test_overview_truncation() {
    let exact = "a".repeat(150);
    assert_eq!(truncate_overview(&exact, 150), exact);

    let long = format!("{}{}", "b".repeat(150), "tail");
    assert_eq!(truncate_overview(&long, 150), format!("{}...", "b".repeat(150)));

    let wide = "é".repeat(151);
    let cut = truncate_overview(&wide, 150);
    assert_eq!(cut.chars().count(), 153);
    assert!(cut.starts_with(&"é".repeat(150)));
}

#[test]
fn test_truncated_overview_in_card() {
    let renderer = CardRenderer::default();
    let mut long = result("Long");
    long.overview = Some("x".repeat(200));
    let markup = renderer.render_results(Some(&[long]), ActionKind::Add);
    assert!(markup.contains(&format!("{}...</p>", "x".repeat(150))));
    assert!(!markup.contains(&"x".repeat(151)));
}

#[test]
fn test_remote_text_is_never_markup() {
    let renderer = CardRenderer::default();
    let mut hostile = result(r#"<script>alert("t")</script> & co"#);
    hostile.overview = Some("<img src=x onerror=alert(1)>".to_string());
    hostile.year = Some("\"><b>".to_string());
    hostile.tmdb_id = TmdbId::new("1\" onclick=\"x");
    let markup = renderer.render_results(Some(&[hostile]), ActionKind::Add);

    assert!(!markup.contains("<script>"));
    assert!(!markup.contains("<img src=x"));
    assert!(!markup.contains("<b>"));
    assert!(!markup.contains("onclick=\"x"));
    assert!(markup.contains("&lt;script&gt;alert(&quot;t&quot;)&lt;/script&gt; &amp; co"));
    assert!(markup.contains(r#"data-tmdb-id="1&quot; onclick=&quot;x""#));
}

#[test]
fn test_poster_placeholder_and_path_fallback() {
    let renderer = CardRenderer::new("https://image.tmdb.org/t/p/w500/", 150);
    let mut from_path = result("Path");
    from_path.poster_url = None;
    from_path.poster_path = Some("/abc.jpg".to_string());
    assert_eq!(
        renderer.poster_src(&from_path).as_deref(),
        Some("https://image.tmdb.org/t/p/w500/abc.jpg")
    );

    let mut none = result("None");
    none.poster_url = Some(String::new());
    let markup = renderer.render_results(Some(&[none]), ActionKind::Add);
    assert!(markup.contains("search-poster-placeholder"));
}

#[test]
fn test_control_states() {
    let renderer = CardRenderer::default();
    let pending = renderer.render_card(&card(result("A"), ControlState::Pending), ActionKind::Add);
    assert!(pending.contains("disabled>Adding...</button>"));

    let done = renderer.render_card(&card(result("A"), ControlState::Done), ActionKind::Add);
    assert!(done.contains("\u{2713} Added"));
    assert!(!done.contains("<button"));

    let ready = renderer.render_card(&card(result("A"), ControlState::Ready), ActionKind::Select);
    assert!(ready.contains(r#"class="btn btn-small inline-select-btn" data-control="7">Select</button>"#));
}

#[test]
fn test_panel_hints() {
    let renderer = CardRenderer::default();
    assert!(renderer.render_panel(&PanelView::Hint, ActionKind::Add).contains(HINT_START));
    assert!(renderer.render_panel(&PanelView::Searching, ActionKind::Add).contains(HINT_SEARCHING));
    assert!(renderer.render_panel(&PanelView::Failed, ActionKind::Add).contains(HINT_FAILED));
}

#[test]
fn test_row_rendering() {
    let renderer = CardRenderer::default();
    let found = ImportCandidate {
        query: "inception".to_string(),
        matched: Some(result("Inception")),
    };
    let markup = renderer.render_row_match(3, &found);
    assert!(markup.contains("Inception (2010)"));
    assert!(markup.contains(r#"data-row="3">Change</button>"#));

    let missing = ImportCandidate {
        query: "<qq>".to_string(),
        matched: None,
    };
    assert!(renderer.render_row_match(4, &missing).contains("&lt;qq&gt;"));

    let fields = AddRequest::from(&result("Inception")).form_pairs();
    let inputs = renderer.render_row_fields(3, &fields, true);
    assert_eq!(inputs.matches(" disabled>").count(), 6);
    assert!(inputs.contains(r#"name="tmdb_id" value="27205""#));
}
