//! The reactive product collection: store rows (newest first) followed by the demo catalog.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::domain::{notifier::SharedNotifier, validation::is_store_id};

use super::{
    CatalogError, CatalogFilter, NewProduct, Product, ProductPatch, SharedStore, StoreError,
};

#[derive(Debug, Default)]
struct CatalogSnapshot {
    remote: Vec<Product>,
    fallback: Vec<Product>,
}

impl CatalogSnapshot {
    fn merged(&self) -> impl Iterator<Item = &Product> {
        self.remote.iter().chain(self.fallback.iter())
    }
}

#[derive(Clone)]
pub struct ProductState {
    store: SharedStore,
    notifier: SharedNotifier,
    snapshot: Arc<RwLock<CatalogSnapshot>>,
}

impl ProductState {
    /// Starts with no store rows. Call [`ProductState::refresh`] to load them.
    pub fn new(store: SharedStore, notifier: SharedNotifier, fallback: Vec<Product>) -> Self {
        let snapshot = CatalogSnapshot { remote: Vec::new(), fallback };
        Self { store, notifier, snapshot: Arc::new(RwLock::new(snapshot)) }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Merged catalog. Ids are not de-duplicated across the two sources.
    pub async fn list(&self) -> Vec<Product> {
        self.snapshot.read().await.merged().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<Product> {
        self.snapshot.read().await.merged().find(|p| p.id == id).cloned()
    }

    pub async fn filter(&self, filter: &CatalogFilter) -> Vec<Product> {
        let products = self.list().await;
        filter.apply(&products)
    }

    /// Replaces the store rows with a fresh read.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        let products = match self.store.list_products().await {
            Ok(products) => products,
            Err(e) => {
                error!("Error fetching products: {e}");
                self.notifier.error("Error al cargar productos");
                return Err(e.into());
            }
        };
        let mut snapshot = self.snapshot.write().await;
        snapshot.remote = products;
        info!("Product catalog refreshed with {} store rows.", snapshot.remote.len());
        Ok(())
    }

    #[instrument(skip_all, fields(title = %product.title))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, CatalogError> {
        if let Err(e) = product.validate().map_err(CatalogError::from) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        let created = match self.store.insert_product(product).await {
            Ok(created) => created,
            Err(e) => {
                error!("Error adding product: {e}");
                self.notifier.error(&format!("Error al crear producto: {e}"));
                return Err(e.into());
            }
        };
        self.notifier.success("Producto creado correctamente");
        self.refresh_after_write().await;
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: &ProductPatch) -> Result<(), CatalogError> {
        let checked = patch.validate().map_err(CatalogError::from);
        if let Err(e) = checked.and_then(|()| self.writable(id)) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        if let Err(e) = self.store.update_product(id, patch).await {
            error!("Error updating product: {e}");
            self.notifier.error("Error al actualizar producto");
            return Err(not_found_or_store(id, e));
        }
        self.notifier.success("Producto actualizado correctamente");
        self.refresh_after_write().await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
        if let Err(e) = self.writable(id) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        if let Err(e) = self.store.delete_product(id).await {
            error!("Error deleting product: {e}");
            self.notifier.error("Error al eliminar producto");
            return Err(not_found_or_store(id, e));
        }
        self.notifier.success("Producto eliminado correctamente");
        self.refresh_after_write().await;
        Ok(())
    }

    /// The write is already durable, so a failed re-read only leaves the snapshot stale until the
    /// next change notification.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            warn!("Catalog left stale after a committed write: {e}");
        }
    }

    /// Bumps every in-memory copy of the product at once, then asks the store for the atomic
    /// increment whenever the id is in the store's format, listed locally or not. A failed remote
    /// increment keeps the local bump. Returns the new count, read back from the store when there
    /// was no local copy.
    #[instrument(skip(self))]
    pub async fn increment_views(&self, id: &str) -> Result<i64, CatalogError> {
        let local = {
            let mut snapshot = self.snapshot.write().await;
            let CatalogSnapshot { remote, fallback } = &mut *snapshot;
            let mut views = None;
            for product in remote.iter_mut().chain(fallback.iter_mut()).filter(|p| p.id == id) {
                let bumped = product.views() + 1;
                product.views = Some(bumped);
                views.get_or_insert(bumped);
            }
            views
        };

        if !is_store_id(id) {
            return local.ok_or_else(|| CatalogError::ProductNotFound(id.to_owned()));
        }
        if let Err(e) = self.store.increment_views(id).await {
            error!("Error incrementing views: {e}");
            self.notifier.error("Error al registrar la visita");
            return Err(not_found_or_store(id, e));
        }
        match local {
            Some(views) => Ok(views),
            None => self
                .store
                .find_product(id)
                .await?
                .map(|p| p.views())
                .ok_or_else(|| CatalogError::ProductNotFound(id.to_owned())),
        }
    }

    fn writable(&self, id: &str) -> Result<(), CatalogError> {
        if is_store_id(id) {
            Ok(())
        } else {
            Err(CatalogError::ReadOnly(id.to_owned()))
        }
    }
}

fn not_found_or_store(id: &str, err: StoreError) -> CatalogError {
    match err {
        StoreError::NotFound(_) => CatalogError::ProductNotFound(id.to_owned()),
        other => other.into(),
    }
}

//-------------------------- Tests -------------------------------
