//! Product catalog lookup used to render wishlist entries.
//!
//! SYSTEM CONTEXT
//! ==============
//! The wishlist stores identifiers only. Display attributes are resolved
//! against the catalog on every render, so catalog edits show up in saved
//! wishlists and retired products silently drop out of view.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id in catalog: {0}")]
    DuplicateProduct(String),
    #[error("catalog entry has an empty product id")]
    EmptyProductId,
}

/// Display attributes for one rental item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

impl ProductDetails {
    /// Minimal details for an identifier no catalog is available to resolve.
    #[must_use]
    pub fn unresolved(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            subtitle: None,
            description: String::new(),
            quantity: None,
            dimensions: None,
            category: None,
            subcategory: None,
        }
    }
}

/// Identifier to display-attribute lookup.
pub trait ProductCatalog: Send + Sync {
    fn lookup(&self, product_id: &str) -> Option<ProductDetails>;
}

/// Catalog held entirely in memory, typically loaded from a JSON array.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: HashMap<String, ProductDetails>,
}

impl StaticCatalog {
    pub fn new(products: impl IntoIterator<Item = ProductDetails>) -> Result<Self, CatalogError> {
        let mut map = HashMap::new();
        for product in products {
            if product.id.trim().is_empty() {
                return Err(CatalogError::EmptyProductId);
            }
            if map.contains_key(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
            map.insert(product.id.clone(), product);
        }
        Ok(Self { products: map })
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let products: Vec<ProductDetails> = serde_json::from_str(raw)?;
        Self::new(products)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products in `category`, optionally narrowed to `subcategory`, sorted by name.
    #[must_use]
    pub fn in_category(&self, category: &str, subcategory: Option<&str>) -> Vec<&ProductDetails> {
        let mut matches: Vec<&ProductDetails> = self
            .products
            .values()
            .filter(|p| p.category.as_deref() == Some(category))
            .filter(|p| subcategory.is_none_or(|sub| p.subcategory.as_deref() == Some(sub)))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matches
    }
}

impl ProductCatalog for StaticCatalog {
    fn lookup(&self, product_id: &str) -> Option<ProductDetails> {
        self.products.get(product_id).cloned()
    }
}

/// Resolve wishlist identifiers in order, skipping ones the catalog no
/// longer carries.
pub fn resolve_entries(catalog: &dyn ProductCatalog, product_ids: &[String]) -> Vec<ProductDetails> {
    product_ids
        .iter()
        .filter_map(|id| {
            let details = catalog.lookup(id);
            if details.is_none() {
                debug!(product_id = %id, "wishlist entry not in catalog");
            }
            details
        })
        .collect()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
