//! Order entity - A placed order with a price snapshot taken at checkout.
//!
//! `status` and `delivery_method` hold the lowercase names of
//! [`crate::core::order::OrderStatus`] and [`crate::core::order::DeliveryMethod`].
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who placed the order
    pub user_id: String,
    /// Lifecycle status: `"pending"`, `"paid"`, `"shipped"`, `"delivered"` or `"cancelled"`
    pub status: String,
    /// `"pickup"` or `"delivery"`
    pub delivery_method: String,
    /// Delivery address; None for pickup orders
    pub delivery_address: Option<String>,
    /// Items subtotal in cents
    pub items_price: i64,
    /// Shipping charge in cents
    pub shipping_price: i64,
    /// Grand total in cents
    pub total_price: i64,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
