//! Postgres implementation of the catalog store. Change notifications are published by table
//! triggers (see migrations) on the `catalog_changes` channel.

use async_trait::async_trait;
use futures::StreamExt;
use jiff_sqlx::Timestamp;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgListener, types::Json};
use tracing::warn;
use uuid::Uuid;

use crate::domain::validation::is_store_id;

use super::{
    CatalogStore, ChangeStream, NewProduct, NewSale, Product, ProductPatch, Sale, SaleId,
    StoreError, TableChange,
};

pub const CHANGE_CHANNEL: &str = "catalog_changes";

const PRODUCT_COLUMNS: &str = "id, title, category, type AS product_type, price, image, \
     description, features, tags, preview, downloads, rating, views, download_url";

const SALE_COLUMNS: &str = "id, product_id, buyer_email, amount, currency, payment_provider, \
     payment_id, payment_status, product_data, created_at";

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_id(id: &str) -> Option<Uuid> {
    if is_store_id(id) {
        Uuid::parse_str(id).ok()
    } else {
        None
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC");
        sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let Some(uuid) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO products
                (title, category, type, price, image, description, features, tags, preview,
                 download_url, downloads, rating, views)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, 0, 0)
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&product.title)
            .bind(product.category.to_string())
            .bind(product.product_type.to_string())
            .bind(product.price)
            .bind(&product.image)
            .bind(&product.description)
            .bind(&product.features)
            .bind(&product.tags)
            .bind(&product.preview)
            .bind(&product.download_url)
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<(), StoreError> {
        let uuid = parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = now()");
        if let Some(title) = &patch.title {
            builder.push(", title = ").push_bind(title.clone());
        }
        if let Some(category) = patch.category {
            builder.push(", category = ").push_bind(category.to_string());
        }
        if let Some(product_type) = patch.product_type {
            builder.push(", type = ").push_bind(product_type.to_string());
        }
        if let Some(price) = patch.price {
            builder.push(", price = ").push_bind(price);
        }
        if let Some(image) = &patch.image {
            builder.push(", image = ").push_bind(image.clone());
        }
        if let Some(description) = &patch.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(features) = &patch.features {
            builder.push(", features = ").push_bind(features.clone());
        }
        if let Some(tags) = &patch.tags {
            builder.push(", tags = ").push_bind(tags.clone());
        }
        if let Some(preview) = &patch.preview {
            builder.push(", preview = ").push_bind(preview.clone());
        }
        if let Some(download_url) = &patch.download_url {
            builder.push(", download_url = ").push_bind(download_url.clone());
        }
        builder.push(" WHERE id = ").push_bind(uuid);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_owned()));
        }
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let uuid = parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_owned()));
        }
        Ok(())
    }

    async fn increment_views(&self, id: &str) -> Result<(), StoreError> {
        let uuid = parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        sqlx::query("SELECT increment_views($1)")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_sale(&self, sale: &NewSale) -> Result<Sale, StoreError> {
        let product_id = parse_id(&sale.product_id)
            .ok_or_else(|| StoreError::NotFound(sale.product_id.clone()))?;
        let sql = format!(
            "INSERT INTO sales
                (product_id, buyer_email, amount, currency, payment_provider, payment_id,
                 payment_status, product_data)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {SALE_COLUMNS}"
        );
        sqlx::query_as::<_, SaleRow>(&sql)
            .bind(product_id)
            .bind(&sale.buyer_email)
            .bind(sale.amount)
            .bind(&sale.currency)
            .bind(&sale.payment_provider)
            .bind(&sale.payment_id)
            .bind(&sale.payment_status)
            .bind(Json(&sale.product_data))
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(Into::into)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, StoreError> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn subscribe(&self) -> Result<ChangeStream, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let changes = listener.into_stream().filter_map(|notification| async move {
            match notification {
                Ok(notification) => {
                    let change = TableChange::from_payload(notification.payload());
                    if change.is_none() {
                        warn!("Ignoring unrecognised change notification {:?}", notification.payload());
                    }
                    change.map(Ok)
                }
                Err(e) => Some(Err(StoreError::from(e))),
            }
        });
        Ok(changes.boxed())
    }
}

//--------------------------- Rows -------------------------------

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    title: String,
    category: String,
    product_type: String,
    price: Decimal,
    image: String,
    description: String,
    features: Vec<String>,
    tags: Vec<String>,
    preview: Vec<String>,
    downloads: i64,
    rating: f64,
    views: Option<i64>,
    download_url: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse()
            .map_err(|_| StoreError::Decode(format!("unknown category {}", row.category)))?;
        let product_type = row
            .product_type
            .parse()
            .map_err(|_| StoreError::Decode(format!("unknown product type {}", row.product_type)))?;
        Ok(Product {
            id: row.id.to_string(),
            title: row.title,
            category,
            product_type,
            price: row.price,
            image: row.image,
            description: row.description,
            features: row.features,
            tags: row.tags,
            preview: row.preview,
            downloads: row.downloads,
            rating: row.rating,
            views: row.views,
            download_url: row.download_url,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: SaleId,
    product_id: Option<Uuid>,
    buyer_email: String,
    amount: Decimal,
    currency: String,
    payment_provider: String,
    payment_id: String,
    payment_status: String,
    product_data: Json<Product>,
    created_at: Timestamp,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            product_id: row.product_id.map(|id| id.to_string()),
            buyer_email: row.buyer_email,
            amount: row.amount,
            currency: row.currency,
            payment_provider: row.payment_provider,
            payment_id: row.payment_id,
            payment_status: row.payment_status,
            product_data: row.product_data.0,
            created_at: row.created_at.to_jiff(),
        }
    }
}

//-------------------------- Tests -------------------------------
