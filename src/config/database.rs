//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Composite uniqueness rules that entity attributes cannot express
//! (one line per product per cart, one favorite per product per owner) are
//! added as explicit unique indexes.

use crate::entities::{Cart, CartItem, Favorite, Order, OrderItem, Product, cart_item, favorite};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

/// Default connection string used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Gets the database URL from the environment, falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
///
/// Both `sqlite://` and `postgres://` URLs are accepted.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables and unique indexes.
///
/// Tables are created parents-first so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Cart),
        schema.create_table_from_entity(CartItem),
        schema.create_table_from_entity(Favorite),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
    ];
    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    let indexes = [
        Index::create()
            .name("idx_cart_items_cart_product")
            .table(CartItem)
            .col(cart_item::Column::CartId)
            .col(cart_item::Column::ProductId)
            .unique()
            .to_owned(),
        Index::create()
            .name("idx_favorites_user_product")
            .table(Favorite)
            .col(favorite::Column::UserId)
            .col(favorite::Column::ProductId)
            .unique()
            .to_owned(),
        Index::create()
            .name("idx_favorites_session_product")
            .table(Favorite)
            .col(favorite::Column::SessionFavoriteId)
            .col(favorite::Column::ProductId)
            .unique()
            .to_owned(),
    ];
    for index in &indexes {
        db.execute(builder.build(index)).await?;
    }

    info!("Database schema created");
    Ok(())
}
