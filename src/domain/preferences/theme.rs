use std::sync::Arc;

use axum::{Json, extract::State};
use tokio::sync::RwLock;

use super::{SharedLocalStore, THEME_KEY, persist, restore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

pub async fn theme_endpoint(State(theme): State<ThemeState>) -> Json<ThemeResponse> {
    Json(ThemeResponse { theme: theme.current().await })
}

pub async fn toggle_theme_endpoint(State(theme): State<ThemeState>) -> Json<ThemeResponse> {
    Json(ThemeResponse { theme: theme.toggle().await })
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Clone)]
pub struct ThemeState {
    current: Arc<RwLock<Theme>>,
    storage: SharedLocalStore,
}

impl ThemeState {
    pub async fn load(storage: SharedLocalStore) -> Self {
        let theme = restore(storage.as_ref(), THEME_KEY).await.unwrap_or_default();
        Self { current: Arc::new(RwLock::new(theme)), storage }
    }

    pub async fn current(&self) -> Theme {
        *self.current.read().await
    }

    pub async fn toggle(&self) -> Theme {
        let mut current = self.current.write().await;
        *current = current.toggled();
        persist(self.storage.as_ref(), THEME_KEY, &*current).await;
        *current
    }
}
