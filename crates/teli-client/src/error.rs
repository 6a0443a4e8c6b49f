use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        ClientError::Other(message.into())
    }
}
