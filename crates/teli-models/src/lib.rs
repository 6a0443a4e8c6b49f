pub mod add_request;
pub mod import;
pub mod media;
pub mod search_result;
pub mod status;

pub use add_request::{AddAck, AddRequest};
pub use import::{parse_titles, ImportCandidate};
pub use media::{MediaType, TmdbId};
pub use search_result::{SearchResponse, SearchResult};
pub use status::ListStatus;
