//! Device-local preferences, restored once at start-up.

mod favorites;
mod local_store;
mod theme;

pub use favorites::{FavoriteToggled, Favorites, favorites_endpoint, toggle_favorite_endpoint};
pub use local_store::{
    AUTH_USER_KEY, FAVORITES_KEY, FileLocalStore, LocalStore, MemoryLocalStore, SharedLocalStore,
    StorageError, THEME_KEY, forget, persist, restore,
};
pub use theme::{Theme, ThemeResponse, ThemeState, theme_endpoint, toggle_theme_endpoint};
