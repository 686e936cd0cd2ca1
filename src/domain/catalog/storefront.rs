//! Storefront catalog slice: grid, detail page and view counting.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::infra::ClientError;

use super::{CatalogError, CatalogFilter, Product, ProductState};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewsResponse {
    pub id: String,
    pub views: i64,
}

pub async fn list_products_endpoint(
    State(products): State<ProductState>,
    Query(filter): Query<CatalogFilter>,
) -> Json<Vec<Product>> {
    Json(products.filter(&filter).await)
}

pub async fn product_endpoint(
    State(products): State<ProductState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ClientError> {
    let product = products.get(&id).await.ok_or(CatalogError::ProductNotFound(id))?;
    Ok(Json(product))
}

/// Called when a detail page is shown.
pub async fn increment_views_endpoint(
    State(products): State<ProductState>,
    Path(id): Path<String>,
) -> Result<Json<ViewsResponse>, ClientError> {
    let views = products.increment_views(&id).await?;
    Ok(Json(ViewsResponse { id, views }))
}
