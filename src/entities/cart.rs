//! Cart entity - A shopping cart owned by either a guest session or a user.
//!
//! Exactly one of `user_id` / `session_cart_id` is set. The price columns are
//! derived from the cart's items and are only ever written by the price
//! calculator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "carts")]
pub struct Model {
    /// Unique identifier for the cart
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user, for signed-in carts
    #[sea_orm(unique)]
    pub user_id: Option<String>,
    /// Owning guest session (`sessionCartId` cookie), for anonymous carts
    #[sea_orm(unique)]
    pub session_cart_id: Option<String>,
    /// Sum of effective unit price times quantity, in cents
    pub items_price: i64,
    /// Shipping charge in cents
    pub shipping_price: i64,
    /// `items_price + shipping_price`
    pub total_price: i64,
    /// When the cart was created
    pub created_at: DateTimeUtc,
    /// When the cart was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Cart and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One cart has many items
    #[sea_orm(has_many = "super::cart_item::Entity")]
    Items,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
