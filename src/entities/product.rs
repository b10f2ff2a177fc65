//! Product entity - Represents a chocolate product in the catalog.
//!
//! Prices are stored in cents. The effective unit price of a product is its
//! discount price while a discount is active, otherwise its list price.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Dark Chocolate 70%")
    pub name: String,
    /// URL-friendly unique handle
    #[sea_orm(unique)]
    pub slug: String,
    /// Catalog category (e.g., "bars", "truffles")
    pub category: String,
    /// List price in cents
    pub price: i64,
    /// Discounted price in cents, if one has been configured
    pub discount_price: Option<i64>,
    /// Whether `discount_price` currently applies
    pub is_discount_active: bool,
    /// Units available for sale
    pub stock: i32,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product can sit in many carts
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// A product can be favorited many times
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
