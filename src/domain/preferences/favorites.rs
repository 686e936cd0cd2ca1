use std::{collections::BTreeSet, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
};
use tokio::sync::RwLock;

use super::{FAVORITES_KEY, SharedLocalStore, persist, restore};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggled {
    pub id: String,
    pub is_favorite: bool,
}

pub async fn favorites_endpoint(State(favorites): State<Favorites>) -> Json<Vec<String>> {
    Json(favorites.list().await)
}

pub async fn toggle_favorite_endpoint(
    State(favorites): State<Favorites>,
    Path(id): Path<String>,
) -> Json<FavoriteToggled> {
    let is_favorite = favorites.toggle(&id).await;
    Json(FavoriteToggled { id, is_favorite })
}

//------------------------ Favorites ----------------------------

/// The set of product ids marked as favorite on this device.
#[derive(Clone)]
pub struct Favorites {
    ids: Arc<RwLock<BTreeSet<String>>>,
    storage: SharedLocalStore,
}

impl Favorites {
    pub async fn load(storage: SharedLocalStore) -> Self {
        let ids: BTreeSet<String> = restore(storage.as_ref(), FAVORITES_KEY).await.unwrap_or_default();
        Self { ids: Arc::new(RwLock::new(ids)), storage }
    }

    /// Flips membership of `id` and returns whether it is now a favorite.
    pub async fn toggle(&self, id: &str) -> bool {
        let mut ids = self.ids.write().await;
        let now_favorite = if ids.remove(id) {
            false
        } else {
            ids.insert(id.to_owned());
            true
        };
        persist(self.storage.as_ref(), FAVORITES_KEY, &*ids).await;
        now_favorite
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.ids.read().await.contains(id)
    }

    pub async fn list(&self) -> Vec<String> {
        self.ids.read().await.iter().cloned().collect()
    }
}
