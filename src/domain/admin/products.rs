//! Admin product management slice.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{
        auth::AdminSession,
        catalog::{AdminSearch, CatalogError, NewProduct, Product, ProductPatch, ProductState},
    },
    infra::ClientError,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdminProductsResponse {
    pub products: Vec<Product>,
    /// Size of the whole catalog, before the search.
    pub total: usize,
}

pub async fn search_products_endpoint(
    AdminSession(_admin): AdminSession,
    State(products): State<ProductState>,
    Query(search): Query<AdminSearch>,
) -> Json<AdminProductsResponse> {
    let catalog = products.list().await;
    Json(AdminProductsResponse { products: search.apply(&catalog), total: catalog.len() })
}

pub async fn create_product_endpoint(
    AdminSession(_admin): AdminSession,
    State(products): State<ProductState>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ClientError> {
    let created = products.create(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_product_endpoint(
    AdminSession(_admin): AdminSession,
    State(products): State<ProductState>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ClientError> {
    products.update(&id, &patch).await?;
    let updated = products.get(&id).await.ok_or(CatalogError::ProductNotFound(id))?;
    Ok(Json(updated))
}

pub async fn delete_product_endpoint(
    AdminSession(_admin): AdminSession,
    State(products): State<ProductState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ClientError> {
    products.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
