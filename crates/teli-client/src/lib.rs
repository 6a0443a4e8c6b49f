pub mod error;
pub mod http;
pub mod traits;

pub use error::ClientError;
pub use http::{decode_search_body, search_url, HttpClient, RawResponse, REQUESTED_WITH};
pub use traits::WatchlistApi;
