use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{NewProduct, NewSale, Product, ProductPatch, Sale, StoreError, TableChange};

pub type ChangeStream = BoxStream<'static, Result<TableChange, StoreError>>;

pub type SharedStore = Arc<dyn CatalogStore>;

/// The managed table storage behind the storefront: products, sales and a change feed.
///
/// Product ids that are not in the store's UUID format are never found, which is how the static
/// demo catalog stays client side only.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn find_product(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Inserts with downloads, rating and views set to zero.
    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError>;

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<(), StoreError>;

    async fn delete_product(&self, id: &str) -> Result<(), StoreError>;

    /// Atomic server side `views = views + 1`.
    async fn increment_views(&self, id: &str) -> Result<(), StoreError>;

    async fn insert_sale(&self, sale: &NewSale) -> Result<Sale, StoreError>;

    /// All sales, newest first.
    async fn list_sales(&self) -> Result<Vec<Sale>, StoreError>;

    /// Insert, update and delete notifications for every table, from any client.
    async fn subscribe(&self) -> Result<ChangeStream, StoreError>;
}
