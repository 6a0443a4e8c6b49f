use crate::error::ClientError;
use async_trait::async_trait;
use std::sync::Arc;
use teli_models::{AddAck, AddRequest, SearchResult};

/// The two server endpoints the interaction layer talks to.
#[async_trait]
pub trait WatchlistApi: Send + Sync {
    /// `GET /api/search?q=...`. Callers pass the raw query; implementations trim and encode it.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError>;

    /// `POST /add` with the form-encoded result fields
    async fn add(&self, request: &AddRequest) -> Result<AddAck, ClientError>;
}

#[async_trait]
impl<T: WatchlistApi + ?Sized> WatchlistApi for Arc<T> {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        (**self).search(query).await
    }

    async fn add(&self, request: &AddRequest) -> Result<AddAck, ClientError> {
        (**self).add(request).await
    }
}
