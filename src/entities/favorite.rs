//! Favorite entity - A product marked as favorite by a user or a guest session.
//!
//! Guest rows carry `session_favorite_id` and a null `user_id`; user rows carry
//! `user_id`. Uniqueness is enforced per user and per session by two composite
//! indexes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Favorite database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user, None for guest favorites
    pub user_id: Option<String>,
    /// Owning guest session (`sessionFavoriteId` cookie)
    pub session_favorite_id: Option<String>,
    /// Favorited product
    pub product_id: i64,
    /// When the product was favorited; preserved across merges
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Favorite and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each favorite references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
