//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::catalog::ProductConfig,
    core::product,
    entities::{self, Product, cart_item, favorite},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

fn product_entry(name: &str, price: i64, stock: i32) -> ProductConfig {
    ProductConfig {
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        category: "bars".to_string(),
        price,
        discount_price: None,
        is_discount_active: false,
        stock,
    }
}

/// Creates a product without a discount. The slug is derived from the name.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    stock: i32,
) -> Result<entities::product::Model> {
    product::create_product(db, &product_entry(name, price, stock)).await
}

/// Creates a product with an active discount.
pub async fn create_discounted_product(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    discount_price: i64,
    stock: i32,
) -> Result<entities::product::Model> {
    let mut entry = product_entry(name, price, stock);
    entry.discount_price = Some(discount_price);
    entry.is_discount_active = true;
    product::create_product(db, &entry).await
}

/// Builds an unsaved product model for pure pricing tests.
#[must_use]
pub fn sample_product(id: i64, price: i64, stock: i32) -> entities::product::Model {
    let now = Utc::now();
    entities::product::Model {
        id,
        name: format!("Sample {id}"),
        slug: format!("sample-{id}"),
        category: "bars".to_string(),
        price,
        discount_price: None,
        is_discount_active: false,
        stock,
        created_at: now,
        updated_at: now,
    }
}

/// Reloads a product, failing if it is gone.
pub async fn get_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<entities::product::Model> {
    product::require_product(db, product_id).await
}

/// Overwrites a product's stock, simulating sales elsewhere.
pub async fn set_product_stock(
    db: &DatabaseConnection,
    product_id: i64,
    stock: i32,
) -> Result<entities::product::Model> {
    let mut active: entities::product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();
    active.stock = Set(stock);
    active.update(db).await.map_err(Into::into)
}

/// Inserts a cart line directly, bypassing stock checks and repricing.
pub async fn insert_cart_line(
    db: &DatabaseConnection,
    cart_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<cart_item::Model> {
    cart_item::ActiveModel {
        cart_id: Set(cart_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a favorite row directly with a chosen timestamp.
pub async fn insert_favorite(
    db: &DatabaseConnection,
    user_id: Option<&str>,
    session_favorite_id: Option<&str>,
    product_id: i64,
    created_at: DateTime<Utc>,
) -> Result<favorite::Model> {
    favorite::ActiveModel {
        user_id: Set(user_id.map(str::to_string)),
        session_favorite_id: Set(session_favorite_id.map(str::to_string)),
        product_id: Set(product_id),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
