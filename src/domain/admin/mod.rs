//! Admin dashboard: product management, sales and stats. Every route requires an admin session.

mod products;
mod sales;
mod stats;

pub use products::{
    AdminProductsResponse, create_product_endpoint, delete_product_endpoint,
    search_products_endpoint, update_product_endpoint,
};
pub use sales::{SalesResponse, SalesSummary, sales_endpoint};
pub use stats::{DashboardStats, stats_endpoint};
