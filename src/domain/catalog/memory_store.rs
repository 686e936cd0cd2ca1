//! In-process catalog store. Backs `--in-memory` runs and the test suite.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::validation::is_store_id;

use super::{
    CatalogStore, CatalogTable, ChangeOperation, ChangeStream, NewProduct, NewSale, Product,
    ProductPatch, Sale, SaleId, StoreError, TableChange,
};

#[derive(Default)]
struct Tables {
    // Newest first.
    products: Vec<Product>,
    sales: Vec<Sale>,
    view_increments: Vec<String>,
    rejecting_writes: Option<String>,
}

#[derive(Clone)]
pub struct MemoryCatalogStore {
    tables: Arc<Mutex<Tables>>,
    changes: broadcast::Sender<TableChange>,
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self { tables: Arc::new(Mutex::new(Tables::default())), changes }
    }

    /// Ids passed to the remote view increment, in call order.
    pub fn view_increments(&self) -> Vec<String> {
        self.lock().view_increments.clone()
    }

    /// Makes every subsequent write fail with `Rejected(reason)` until cleared with `None`.
    pub fn reject_writes(&self, reason: Option<&str>) {
        self.lock().rejecting_writes = reason.map(str::to_owned);
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, table: CatalogTable, operation: ChangeOperation) {
        // No receivers is fine.
        let _ = self.changes.send(TableChange::new(table, operation));
    }

    fn check_writable(tables: &Tables) -> Result<(), StoreError> {
        match &tables.rejecting_writes {
            Some(reason) => Err(StoreError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.lock().products.clone())
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        if !is_store_id(id) {
            return Ok(None);
        }
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let created = {
            let mut tables = self.lock();
            Self::check_writable(&tables)?;
            let created = Product {
                id: Uuid::new_v4().to_string(),
                title: product.title.clone(),
                category: product.category,
                product_type: product.product_type,
                price: product.price,
                image: product.image.clone(),
                description: product.description.clone(),
                features: product.features.clone(),
                tags: product.tags.clone(),
                preview: product.preview.clone(),
                downloads: 0,
                rating: 0.0,
                views: Some(0),
                download_url: product.download_url.clone(),
            };
            tables.products.insert(0, created.clone());
            created
        };
        self.publish(CatalogTable::Products, ChangeOperation::Insert);
        Ok(created)
    }

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<(), StoreError> {
        {
            let mut tables = self.lock();
            Self::check_writable(&tables)?;
            let product = tables
                .products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
            patch.apply_to(product);
        }
        self.publish(CatalogTable::Products, ChangeOperation::Update);
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut tables = self.lock();
            Self::check_writable(&tables)?;
            let before = tables.products.len();
            tables.products.retain(|p| p.id != id);
            if tables.products.len() == before {
                return Err(StoreError::NotFound(id.to_owned()));
            }
        }
        self.publish(CatalogTable::Products, ChangeOperation::Delete);
        Ok(())
    }

    async fn increment_views(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut tables = self.lock();
            tables.view_increments.push(id.to_owned());
            Self::check_writable(&tables)?;
            let product = tables
                .products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
            product.views = Some(product.views() + 1);
        }
        self.publish(CatalogTable::Products, ChangeOperation::Update);
        Ok(())
    }

    async fn insert_sale(&self, sale: &NewSale) -> Result<Sale, StoreError> {
        let created = {
            let mut tables = self.lock();
            Self::check_writable(&tables)?;
            let created = Sale {
                id: SaleId::new(),
                product_id: Some(sale.product_id.clone()),
                buyer_email: sale.buyer_email.clone(),
                amount: sale.amount,
                currency: sale.currency.clone(),
                payment_provider: sale.payment_provider.clone(),
                payment_id: sale.payment_id.clone(),
                payment_status: sale.payment_status.clone(),
                product_data: sale.product_data.clone(),
                created_at: jiff::Timestamp::now(),
            };
            tables.sales.insert(0, created.clone());
            created
        };
        self.publish(CatalogTable::Sales, ChangeOperation::Insert);
        Ok(created)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, StoreError> {
        Ok(self.lock().sales.clone())
    }

    async fn subscribe(&self) -> Result<ChangeStream, StoreError> {
        let receiver = self.changes.subscribe();
        let changes = futures::stream::unfold(receiver, |mut receiver| async move {
            let change = match receiver.recv().await {
                Ok(change) => change,
                // Missed notifications still mean the products may have changed.
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    TableChange::new(CatalogTable::Products, ChangeOperation::Update)
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            };
            Some((Ok(change), receiver))
        });
        Ok(changes.boxed())
    }
}
