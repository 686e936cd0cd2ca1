//! Dashboard cards over the merged catalog.

use axum::{Json, extract::State};
use rust_decimal::Decimal;

use crate::domain::{
    auth::AdminSession,
    catalog::{Product, ProductState},
};

const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub total_downloads: i64,
    pub total_views: i64,
    /// Estimate: price times downloads.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    /// One decimal place, zero for an empty catalog.
    pub avg_rating: f64,
    pub top_products: Vec<Product>,
}

impl DashboardStats {
    pub fn compute(products: &[Product]) -> Self {
        let avg_rating = if products.is_empty() {
            0.0
        } else {
            let mean = products.iter().map(|p| p.rating).sum::<f64>() / products.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        let mut top_products = products.to_vec();
        top_products.sort_by(|a, b| b.downloads.cmp(&a.downloads));
        top_products.truncate(TOP_PRODUCTS);

        Self {
            total_products: products.len(),
            total_downloads: products.iter().map(|p| p.downloads).sum(),
            total_views: products.iter().map(Product::views).sum(),
            total_revenue: products.iter().map(|p| p.price * Decimal::from(p.downloads)).sum(),
            avg_rating,
            top_products,
        }
    }
}

pub async fn stats_endpoint(
    AdminSession(_admin): AdminSession,
    State(products): State<ProductState>,
) -> Json<DashboardStats> {
    Json(DashboardStats::compute(&products.list().await))
}
