mod demo;
mod errors;
mod filter;
mod memory_store;
mod pg_store;
mod product;
mod product_state;
mod store;
mod storefront;

pub use demo::demo_catalog;
pub use errors::{CatalogError, StoreError};
pub use filter::{AdminSearch, CatalogFilter, Selection, SortOrder};
pub use memory_store::MemoryCatalogStore;
pub use pg_store::{CHANGE_CHANNEL, PgCatalogStore};
pub use product::{
    CatalogTable, Category, ChangeOperation, NewProduct, NewSale, Product, ProductPatch,
    ProductType, SALE_STATUS_COMPLETED, Sale, SaleId, TableChange,
};
pub use product_state::ProductState;
pub use store::{CatalogStore, ChangeStream, SharedStore};
pub use storefront::{
    ViewsResponse, increment_views_endpoint, list_products_endpoint, product_endpoint,
};
