//! Catalog rows: products, sales and the change notifications the store publishes about them.

use rust_decimal::Decimal;
use strum_macros::{Display, EnumString};
use validator::Validate;

use crate::{
    domain::validation::{not_blank, positive_amount},
    uuid_id,
};

uuid_id!(SaleId);

pub const SALE_STATUS_COMPLETED: &str = "completed";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    Display,
    EnumString,
    fake::Dummy,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Escuela,
    Construccion,
    Medico,
    Veterinaria,
    Restaurant,
    Tecnologia,
    Inmobiliaria,
    Fitness,
    Ecommerce,
    Corporativo,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    Display,
    EnumString,
    fake::Dummy,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductType {
    Landing,
    Freepik,
    Templates,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub preview: Vec<String>,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl Product {
    pub fn views(&self) -> i64 {
        self.views.unwrap_or_default()
    }
}

/// A product as submitted by the admin form. The store assigns the id and zeroes the counters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, fake::Dummy, Validate)]
pub struct NewProduct {
    #[validate(custom(function = "not_blank", message = "A title is required."))]
    pub title: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(with = "rust_decimal::serde::float")]
    #[dummy(faker = "crate::domain::fake::Price")]
    #[validate(custom(
        function = "positive_amount",
        message = "The price must be greater than zero."
    ))]
    pub price: Decimal,
    #[validate(custom(function = "not_blank", message = "An image is required."))]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub preview: Vec<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Partial update. Only the fields present are written, the rest are left as stored.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, Validate)]
#[serde(default)]
pub struct ProductPatch {
    #[validate(custom(function = "not_blank", message = "A title is required."))]
    pub title: Option<String>,
    pub category: Option<Category>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[validate(custom(
        function = "positive_amount",
        message = "The price must be greater than zero."
    ))]
    pub price: Option<Decimal>,
    #[validate(custom(function = "not_blank", message = "An image is required."))]
    pub image: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub preview: Option<Vec<String>>,
    pub download_url: Option<String>,
}

impl ProductPatch {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(product_type) = self.product_type {
            product.product_type = product_type;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(features) = &self.features {
            product.features = features.clone();
        }
        if let Some(tags) = &self.tags {
            product.tags = tags.clone();
        }
        if let Some(preview) = &self.preview {
            product.preview = preview.clone();
        }
        if let Some(download_url) = &self.download_url {
            product.download_url = Some(download_url.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub product_id: Option<String>,
    pub buyer_email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_provider: String,
    pub payment_id: String,
    pub payment_status: String,
    pub product_data: Product,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub product_id: String,
    pub buyer_email: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_provider: String,
    pub payment_id: String,
    pub payment_status: String,
    pub product_data: Product,
}

//----------------------- Change notifications --------------------------

#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CatalogTable {
    Products,
    Sales,
    #[strum(default)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableChange {
    pub table: CatalogTable,
    pub operation: ChangeOperation,
}

impl TableChange {
    pub fn new(table: CatalogTable, operation: ChangeOperation) -> Self {
        Self { table, operation }
    }

    /// Notifications are published as `<table>:<OPERATION>`, e.g. `products:UPDATE`.
    pub fn from_payload(payload: &str) -> Option<Self> {
        let (table, operation) = payload.split_once(':')?;
        let table = table.parse().ok()?;
        let operation = operation.parse().ok()?;
        Some(Self { table, operation })
    }

    pub fn affects_products(&self) -> bool {
        self.table == CatalogTable::Products
    }
}

//-------------------------- Tests -------------------------------
