//! Product business logic - catalog reads and seeding.
//!
//! The cart, favorites and order modules only ever read products through this
//! module (plus the `cart_item -> product` relation); stock is written back
//! only at checkout.

use crate::{
    config::catalog::{CatalogConfig, ProductConfig},
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// Retrieves a product by id.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id, failing with [`Error::ProductNotFound`] if it is missing.
pub async fn require_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    get_product_by_id(db, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Finds a product by its slug.
pub async fn get_product_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists products ordered by name, optionally restricted to one category.
pub async fn list_products(
    db: &DatabaseConnection,
    category: Option<&str>,
) -> Result<Vec<product::Model>> {
    let mut query = Product::find();
    if let Some(category) = category {
        query = query.filter(product::Column::Category.eq(category));
    }
    query
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a product from a catalog entry after validating it.
///
/// # Errors
/// Returns an error if the entry fails validation or the insert fails
/// (including a duplicate slug).
pub async fn create_product(
    db: &DatabaseConnection,
    entry: &ProductConfig,
) -> Result<product::Model> {
    entry.validate()?;

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        name: Set(entry.name.trim().to_string()),
        slug: Set(entry.slug.trim().to_string()),
        category: Set(entry.category.trim().to_string()),
        price: Set(entry.price),
        discount_price: Set(entry.discount_price),
        is_discount_active: Set(entry.is_discount_active),
        stock: Set(entry.stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Inserts catalog products whose slug is not yet in the database.
///
/// Returns the number of products created.
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<usize> {
    let mut created = 0;
    for entry in &catalog.products {
        if get_product_by_slug(db, entry.slug.trim()).await?.is_some() {
            debug!("Catalog product '{}' already present, skipping", entry.slug);
            continue;
        }
        create_product(db, entry).await?;
        created += 1;
    }
    info!(
        "Catalog seeded: {} created, {} already present",
        created,
        catalog.products.len() - created
    );
    Ok(created)
}
