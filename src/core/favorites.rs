//! Favorites business logic - toggling, listing and the guest-to-user merge.
//!
//! Guest favorites are keyed by the `sessionFavoriteId` cookie and have no
//! user. On sign-in they are moved to the user, keeping their original
//! creation time; products the user already favorites are skipped and the
//! leftover guest rows are removed in the same transaction.

use crate::{
    core::{product::require_product, session::Owner},
    entities::{Favorite, Product, favorite, product},
    errors::Result,
};
use sea_orm::{QueryOrder, Select, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info};

/// Result of folding guest favorites into a user's favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoritesMergeOutcome {
    /// Guest favorites moved to the user
    pub merged: usize,
    /// Guest favorites the user already had
    pub skipped: usize,
}

fn select_favorites(owner: &Owner) -> Select<Favorite> {
    match owner {
        Owner::User(user_id) => {
            Favorite::find().filter(favorite::Column::UserId.eq(user_id.as_str()))
        }
        Owner::Guest(session_id) => Favorite::find()
            .filter(favorite::Column::UserId.is_null())
            .filter(favorite::Column::SessionFavoriteId.eq(session_id.as_str())),
    }
}

/// Adds the product to the owner's favorites, or removes it if already there.
///
/// Returns true when the product is a favorite after the call.
///
/// # Errors
/// Returns an error if the product does not exist or a database operation fails.
pub async fn toggle_favorite(
    db: &DatabaseConnection,
    owner: &Owner,
    product_id: i64,
) -> Result<bool> {
    let txn = db.begin().await?;

    require_product(&txn, product_id).await?;
    let existing = select_favorites(owner)
        .filter(favorite::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let favorited = if let Some(existing) = existing {
        existing.delete(&txn).await?;
        false
    } else {
        let (user_id, session_favorite_id) = match owner {
            Owner::User(user_id) => (Some(user_id.clone()), None),
            Owner::Guest(session_id) => (None, Some(session_id.clone())),
        };
        favorite::ActiveModel {
            user_id: Set(user_id),
            session_favorite_id: Set(session_favorite_id),
            product_id: Set(product_id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        true
    };

    txn.commit().await?;
    debug!("Product {} favorite={} for {:?}", product_id, favorited, owner);
    Ok(favorited)
}

/// Lists the owner's favorite products, most recently favorited first.
pub async fn list_favorites(
    db: &DatabaseConnection,
    owner: &Owner,
) -> Result<Vec<product::Model>> {
    let rows = select_favorites(owner)
        .order_by_desc(favorite::Column::CreatedAt)
        .order_by_desc(favorite::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    Ok(rows.into_iter().filter_map(|(_, product)| product).collect())
}

/// Returns true if the product is among the owner's favorites.
pub async fn is_favorite(db: &DatabaseConnection, owner: &Owner, product_id: i64) -> Result<bool> {
    let count = select_favorites(owner)
        .filter(favorite::Column::ProductId.eq(product_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Moves the guest favorites of `guest_session_id` to `user_id`.
///
/// Guest rows for products the user does not favorite yet are re-created as
/// user rows with no session id and their original `created_at`, so the
/// favorites list keeps its order. Products the user already favorites are
/// counted as skipped, and their guest rows are deleted with the rest. No guest
/// rows of the session remain afterwards.
///
/// The move and the cleanup run in a single transaction.
///
/// # Arguments
/// * `user_id` - Signed-in user receiving the favorites
/// * `guest_session_id` - Value of the guest's `sessionFavoriteId` cookie
///
/// Returns `Ok(None)` when the guest has no favorites.
///
/// # Errors
/// Returns a database error if any step fails; nothing is changed in that case
/// and the guest favorites stay in place.
pub async fn merge_favorites(
    db: &DatabaseConnection,
    user_id: &str,
    guest_session_id: &str,
) -> Result<Option<FavoritesMergeOutcome>> {
    let txn = db.begin().await?;

    let guest_owner = Owner::Guest(guest_session_id.to_string());
    let guest_rows = select_favorites(&guest_owner).all(&txn).await?;
    if guest_rows.is_empty() {
        debug!("No guest favorites for session {}", guest_session_id);
        return Ok(None);
    }

    let already_favorited: HashSet<i64> = select_favorites(&Owner::User(user_id.to_string()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|row| row.product_id)
        .collect();

    let (to_move, duplicates): (Vec<_>, Vec<_>) = guest_rows
        .into_iter()
        .partition(|row| !already_favorited.contains(&row.product_id));

    if !to_move.is_empty() {
        Favorite::delete_many()
            .filter(favorite::Column::Id.is_in(to_move.iter().map(|row| row.id)))
            .exec(&txn)
            .await?;

        let user_rows = to_move.iter().map(|row| favorite::ActiveModel {
            user_id: Set(Some(user_id.to_string())),
            session_favorite_id: Set(None),
            product_id: Set(row.product_id),
            created_at: Set(row.created_at),
            ..Default::default()
        });
        Favorite::insert_many(user_rows).exec(&txn).await?;
    }

    // Leftover guest rows are the duplicates
    let cleaned = delete_guest_favorites(guest_session_id).exec(&txn).await?;
    debug!(
        "Removed {} duplicate guest favorites for session {}",
        cleaned.rows_affected, guest_session_id
    );

    txn.commit().await?;

    let outcome = FavoritesMergeOutcome {
        merged: to_move.len(),
        skipped: duplicates.len(),
    };
    info!(
        "Merged guest favorites of session {} into user {}: {} merged, {} skipped",
        guest_session_id, user_id, outcome.merged, outcome.skipped
    );
    Ok(Some(outcome))
}

fn delete_guest_favorites(guest_session_id: &str) -> sea_orm::DeleteMany<Favorite> {
    Favorite::delete_many()
        .filter(favorite::Column::UserId.is_null())
        .filter(favorite::Column::SessionFavoriteId.eq(guest_session_id))
}
