pub mod debounce;
pub mod escape;
pub mod offline;
pub mod render;
pub mod search;
pub mod widgets;
#[cfg(feature = "runtime")]
pub mod driver;

pub use debounce::{DebounceGate, Generation, RequestSequence, TimerHandle, TimerSlots};
pub use escape::{escape_html, escape_opt};
pub use offline::{CachedResponse, OfflineError, OfflinePlan};
pub use render::{truncate_overview, ActionKind, CardRenderer};
pub use search::{
    Card, Command, ControlId, ControlState, ImportReview, OverlaySession, PanelView, RowIndex,
    SearchContext, SearchPanel, SearchState, UiEvent,
};

#[cfg(feature = "runtime")]
pub use driver::{Observer, SearchDriver};
#[cfg(feature = "runtime")]
pub use offline::{CacheStorage, DiskCacheStorage, FetchSource, MemoryCacheStorage, Network, OfflineWorker};
