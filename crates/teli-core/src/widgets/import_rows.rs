/// Hidden inputs each import row carries, in submission order
pub const HIDDEN_FIELDS: [&str; 6] = [
    "tmdb_id",
    "media_type",
    "title",
    "year",
    "poster_path",
    "overview",
];

/// Disabled inputs are left out of the form submission, which is how
/// unchecked rows are kept out of the bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Enabled,
    Disabled,
}

impl FieldState {
    pub fn is_disabled(self) -> bool {
        self == FieldState::Disabled
    }
}

pub fn field_state(checked: bool) -> FieldState {
    if checked {
        FieldState::Enabled
    } else {
        FieldState::Disabled
    }
}
