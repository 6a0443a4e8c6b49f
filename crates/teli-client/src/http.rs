use crate::error::ClientError;
use crate::traits::WatchlistApi;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use teli_config::ServerConfig;
use teli_models::{AddAck, AddRequest, SearchResponse, SearchResult};
use tracing::{debug, info, warn};

/// Header asking the server for a JSON acknowledgement instead of a redirect
pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "fetch");

/// Build the search URL for a query: trimmed, then percent-encoded.
pub fn search_url(base_url: &str, query: &str) -> String {
    format!(
        "{}/api/search?q={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(query.trim())
    )
}

/// Decode a search body. A missing `results` key is an empty list; anything
/// that is not the expected shape is an error.
pub fn decode_search_body(body: &str) -> Result<Vec<SearchResult>, ClientError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.results)
}

/// Response of a plain GET, used for static assets
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static(REQUESTED_WITH.1),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("teli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Plain GET of a same-origin path. Non-2xx statuses are returned, not raised.
    pub async fn get_raw(&self, path: &str) -> Result<RawResponse, ClientError> {
        let url = self.url(path);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl WatchlistApi for HttpClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        let url = search_url(&self.base_url, query);
        debug!("Searching: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Search request failed with HTTP {}", status);
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let results = decode_search_body(&body)?;
        info!("Search for {:?} returned {} results", query.trim(), results.len());
        Ok(results)
    }

    async fn add(&self, request: &AddRequest) -> Result<AddAck, ClientError> {
        let url = self.url("/add");
        let response = self
            .client
            .post(&url)
            .form(&request.form_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Add of {:?} failed with HTTP {}", request.title, status);
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let ack: AddAck = serde_json::from_str(&body)?;
        info!("Added {:?} ({} {})", request.title, request.media_type, request.tmdb_id);
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_trims_and_encodes() {
        assert_eq!(
            search_url("http://localhost:5001/", "  Tom & Jerry?  "),
            "http://localhost:5001/api/search?q=Tom%20%26%20Jerry%3F"
        );
    }

    #[test]
    fn test_decode_search_body() {
        assert!(decode_search_body("{}").unwrap().is_empty());
        assert!(decode_search_body(r#"{"results":[]}"#).unwrap().is_empty());
        assert!(decode_search_body("<html>login</html>").is_err());
        assert!(decode_search_body(r#"{"results":[{"title":"no id"}]}"#).is_err());
    }

    #[test]
    fn test_rejects_relative_base() {
        assert!(matches!(
            HttpClient::new("teli.local", Duration::from_secs(1)),
            Err(ClientError::InvalidBaseUrl(_))
        ));
        let client = HttpClient::new("https://teli.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "https://teli.local");
        assert_eq!(client.url("/add"), "https://teli.local/add");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = HttpClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = client.search("inception").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
