use std::{cmp::Ordering, fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use strum_macros::EnumString;

use super::{Category, Product, ProductType};

/// `all` or a single value, as used by the category and type selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(selected) => selected == value,
        }
    }
}

impl<T> FromStr for Selection<T>
where
    T: FromStr,
{
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            s.parse().map(Selection::Only)
        }
    }
}

impl<'de, T> Deserialize<'de> for Selection<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortOrder {
    /// Most downloaded first.
    Popularity,
    PriceAsc,
    PriceDesc,
    Rating,
    /// Merged catalog order: store rows newest first, then the demo catalog.
    #[default]
    Newest,
}

/// Storefront grid filter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    pub category: Selection<Category>,
    #[serde(rename = "type")]
    pub product_type: Selection<ProductType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: SortOrder,
}

impl CatalogFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category.matches(&product.category)
            && self.product_type.matches(&product.product_type)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }

    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut selected: Vec<Product> =
            products.iter().filter(|p| self.matches(p)).cloned().collect();
        match self.sort {
            SortOrder::Popularity => selected.sort_by(|a, b| b.downloads.cmp(&a.downloads)),
            SortOrder::PriceAsc => selected.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceDesc => selected.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::Rating => selected.sort_by(|a, b| {
                b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
            }),
            SortOrder::Newest => {}
        }
        selected
    }
}

/// Admin table search: free text over title, category and tags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdminSearch {
    #[serde(rename = "q")]
    pub query: String,
    pub category: Selection<Category>,
    #[serde(rename = "type")]
    pub product_type: Selection<ProductType>,
}

impl AdminSearch {
    pub fn matches(&self, product: &Product) -> bool {
        let needle = self.query.trim().to_lowercase();
        let text_match = needle.is_empty()
            || product.title.to_lowercase().contains(&needle)
            || product.category.to_string().contains(&needle)
            || product.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        text_match
            && self.category.matches(&product.category)
            && self.product_type.matches(&product.product_type)
    }

    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

//-------------------------- Tests -------------------------------
