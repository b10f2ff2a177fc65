//! Guest-to-user cart merge.
//!
//! When a visitor signs in, the cart they filled as a guest is folded into
//! their user cart. Quantities are combined per product and capped at the
//! product's current stock; units that do not fit are dropped and reported as
//! skipped. The guest cart is deleted afterwards. The whole merge runs in one
//! database transaction, so a failure leaves the guest cart untouched for a
//! later retry.

use crate::{
    core::{
        cart::{clamp_to_stock, delete_cart, find_cart, find_or_create_cart},
        pricing::{CartTotals, update_cart_prices},
        session::Owner,
    },
    entities::{CartItem, Product, cart_item},
    errors::Result,
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Result of folding a guest cart into a user cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartMergeOutcome {
    /// Id of the user cart that received the items
    pub user_cart_id: i64,
    /// Guest lines that contributed at least one unit
    pub merged: usize,
    /// Units dropped because the combined line exceeded current stock
    pub skipped: i32,
    /// User cart totals after the merge
    pub totals: CartTotals,
}

/// Folds the guest cart `guest_session_id` into the cart of `user_id`.
///
/// Each guest line is combined with the user line for the same product and the
/// result is capped at the product's current stock, so the user line ends at
/// `min(user + guest, stock)` units. This can lower a user line that was added
/// before the stock dropped; a line capped to zero is removed. Guest lines for
/// products the user does not have yet become new user lines with
/// `min(guest, stock)` units, keeping the guest line's creation time. Units that
/// do not fit are counted in `skipped`.
///
/// The user cart is created if needed, the guest cart and its lines are
/// deleted, and the user cart's prices are recomputed before the commit. Every
/// write happens in one transaction.
///
/// # Arguments
/// * `user_id` - Signed-in user receiving the items
/// * `guest_session_id` - Value of the guest's `sessionCartId` cookie
///
/// Returns `Ok(None)` without writing anything when there is no guest cart
/// or it is empty.
///
/// # Errors
/// Returns a database error if any step fails; all steps are rolled back and
/// the guest cart is left as it was.
pub async fn merge_carts(
    db: &DatabaseConnection,
    user_id: &str,
    guest_session_id: &str,
) -> Result<Option<CartMergeOutcome>> {
    let txn = db.begin().await?;

    let guest_owner = Owner::Guest(guest_session_id.to_string());
    let Some(guest_cart) = find_cart(&txn, &guest_owner).await? else {
        debug!("No guest cart for session {}, nothing to merge", guest_session_id);
        return Ok(None);
    };

    let guest_lines = CartItem::find()
        .filter(cart_item::Column::CartId.eq(guest_cart.id))
        .find_also_related(Product)
        .all(&txn)
        .await?;
    if guest_lines.is_empty() {
        debug!("Guest cart {} is empty, nothing to merge", guest_cart.id);
        return Ok(None);
    }

    let user_cart = find_or_create_cart(&txn, &Owner::User(user_id.to_string())).await?;
    let mut user_lines: HashMap<i64, cart_item::Model> = CartItem::find()
        .filter(cart_item::Column::CartId.eq(user_cart.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| (item.product_id, item))
        .collect();

    let mut merged = 0;
    let mut skipped = 0;

    for (guest_item, product) in guest_lines {
        let Some(product) = product else {
            warn!(
                "Guest cart line {} references missing product {}, dropping it",
                guest_item.id, guest_item.product_id
            );
            skipped += guest_item.quantity;
            continue;
        };

        match user_lines.remove(&product.id) {
            Some(user_item) => {
                let combined = user_item.quantity.saturating_add(guest_item.quantity);
                let new_quantity = clamp_to_stock(combined, product.stock);
                skipped += combined - new_quantity;
                if new_quantity > user_item.quantity {
                    merged += 1;
                }

                if new_quantity == 0 {
                    user_item.delete(&txn).await?;
                } else if new_quantity != user_item.quantity {
                    let mut active: cart_item::ActiveModel = user_item.into();
                    active.quantity = Set(new_quantity);
                    active.update(&txn).await?;
                }
            }
            None => {
                let quantity = clamp_to_stock(guest_item.quantity, product.stock);
                skipped += guest_item.quantity - quantity;

                if quantity > 0 {
                    cart_item::ActiveModel {
                        cart_id: Set(user_cart.id),
                        product_id: Set(product.id),
                        quantity: Set(quantity),
                        created_at: Set(guest_item.created_at),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    merged += 1;
                }
            }
        }
    }

    delete_cart(&txn, guest_cart.id).await?;
    let totals = update_cart_prices(&txn, user_cart.id).await?;

    txn.commit().await?;

    info!(
        "Merged guest cart {} into cart {} of user {}: {} merged, {} units skipped",
        guest_cart.id, user_cart.id, user_id, merged, skipped
    );
    Ok(Some(CartMergeOutcome {
        user_cart_id: user_cart.id,
        merged,
        skipped,
        totals,
    }))
}
