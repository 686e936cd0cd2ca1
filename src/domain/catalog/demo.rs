use super::Product;

const DEMO_CATALOG: &str = include_str!("../../../assets/demo_catalog.json");

/// The static demo products shown after the store's rows. Their ids (`lp-001`, ...) are not in the
/// store's format, so they never reach the store.
pub fn demo_catalog() -> Result<Vec<Product>, serde_json::Error> {
    serde_json::from_str(DEMO_CATALOG)
}
