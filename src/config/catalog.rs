//! Catalog configuration loading from catalog.toml
//!
//! The products listed in catalog.toml are used to seed the database on first
//! run or when a product (identified by slug) is missing.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Display name
    pub name: String,
    /// Unique URL handle, used to detect already-seeded products
    pub slug: String,
    /// Catalog category
    pub category: String,
    /// List price in cents
    pub price: i64,
    /// Optional discount price in cents
    #[serde(default)]
    pub discount_price: Option<i64>,
    /// Whether the discount applies
    #[serde(default)]
    pub is_discount_active: bool,
    /// Initial stock
    pub stock: i32,
}

impl ProductConfig {
    /// Checks the entry for values the catalog cannot hold.
    ///
    /// # Errors
    /// Returns an error if the name or slug is blank, a price or the stock is
    /// negative, or the discount price exceeds the list price.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.slug.trim().is_empty() {
            return Err(Error::Config {
                message: format!("Catalog entry '{}' needs a name and a slug", self.slug),
            });
        }
        if self.price < 0 {
            return Err(Error::InvalidPrice { amount: self.price });
        }
        if let Some(discount) = self.discount_price {
            if discount < 0 || discount > self.price {
                return Err(Error::InvalidPrice { amount: discount });
            }
        }
        if self.stock < 0 {
            return Err(Error::InvalidQuantity {
                quantity: self.stock,
            });
        }
        Ok(())
    }
}

/// Loads the catalog from a TOML file
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read, and [`Error::Config`] if
/// the TOML syntax is invalid or required fields are missing.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path)?;

    parse_catalog(&contents)
}

/// Parses catalog TOML text.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog.toml: {e}"),
    })
}
