//! Stateless page widgets: profile dropdown, flash dismissal, tab bar and the
//! import-row field toggler.

pub mod dropdown;
pub mod flash;
pub mod import_rows;
pub mod tabs;

pub use dropdown::{ClickTarget, ProfileDropdown};
pub use flash::{FlashCategory, FlashPhase, FlashTimeline};
pub use import_rows::{field_state, FieldState, HIDDEN_FIELDS};
pub use tabs::{active_tab, tab_href, tab_links, MediaFilter};
