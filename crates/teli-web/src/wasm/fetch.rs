use super::describe;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response, UrlSearchParams, Window};
use teli_models::{AddAck, AddRequest, SearchResponse, SearchResult};

/// Tells the server to answer `/add` with JSON instead of a redirect
const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "fetch");

pub(crate) async fn search(window: &Window, query: &str) -> Result<Vec<SearchResult>, String> {
    let url = format!("/api/search?q={}", urlencoding::encode(query.trim()));
    let body = send(window, "GET", &url, None).await?;
    let response: SearchResponse =
        serde_json::from_str(&body).map_err(|e| format!("bad search response: {}", e))?;
    Ok(response.results)
}

pub(crate) async fn add(window: &Window, request: &AddRequest) -> Result<AddAck, String> {
    let form = UrlSearchParams::new().map_err(|e| describe(&e))?;
    for (name, value) in request.form_pairs() {
        form.append(name, &value);
    }
    let body = send(window, "POST", "/add", Some(&form)).await?;
    serde_json::from_str(&body).map_err(|e| format!("bad add response: {}", e))
}

async fn send(
    window: &Window,
    method: &str,
    url: &str,
    form: Option<&UrlSearchParams>,
) -> Result<String, String> {
    let init = RequestInit::new();
    init.set_method(method);
    if let Some(form) = form {
        init.set_body(form);
    }

    let request = Request::new_with_str_and_init(url, &init).map_err(|e| describe(&e))?;
    request
        .headers()
        .set(REQUESTED_WITH.0, REQUESTED_WITH.1)
        .map_err(|e| describe(&e))?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| describe(&e))?
        .dyn_into()
        .map_err(|e| describe(&e))?;
    if !response.ok() {
        return Err(format!("{} {} returned HTTP {}", method, url, response.status()));
    }

    let text = response.text().map_err(|e| describe(&e))?;
    JsFuture::from(text)
        .await
        .map_err(|e| describe(&e))?
        .as_string()
        .ok_or_else(|| "response body was not text".to_string())
}
