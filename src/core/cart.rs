//! Cart business logic - Handles cart lookup and line-item changes.
//!
//! A cart belongs to exactly one [`Owner`]: a signed-in user or a guest
//! session. Carts are created lazily on the first add. Every operation that
//! changes lines reprices the cart inside the same database transaction, so
//! the stored totals always match the stored lines.

use crate::{
    core::{
        pricing::{CartTotals, update_cart_prices},
        product::require_product,
        session::Owner,
    },
    entities::{Cart, CartItem, Product, cart, cart_item, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Select, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// One line of a cart together with its product.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// The stored line
    pub item: cart_item::Model,
    /// The product in the line
    pub product: product::Model,
}

/// A cart with all of its lines.
#[derive(Debug, Clone)]
pub struct CartDetails {
    /// The cart row, including its derived totals
    pub cart: cart::Model,
    /// Lines in the order they were added
    pub lines: Vec<CartLine>,
}

impl CartDetails {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|line| line.item.quantity).sum()
    }
}

/// Result of adding a product to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddToCartOutcome {
    /// Quantity of the product now in the cart
    pub quantity: i32,
    /// True when stock limited the quantity below what was asked for
    pub clamped: bool,
    /// Cart totals after the change
    pub totals: CartTotals,
}

/// Result of removing units of a product from a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveFromCartOutcome {
    /// Quantity of the product left in the cart (0 when the line was deleted)
    pub remaining: i32,
    /// Cart totals after the change
    pub totals: CartTotals,
}

/// Caps a requested quantity at the available stock, never going below zero.
#[must_use]
pub fn clamp_to_stock(requested: i32, stock: i32) -> i32 {
    requested.min(stock).max(0)
}

fn select_cart(owner: &Owner) -> Select<Cart> {
    match owner {
        Owner::User(user_id) => Cart::find().filter(cart::Column::UserId.eq(user_id.as_str())),
        Owner::Guest(session_id) => Cart::find()
            .filter(cart::Column::SessionCartId.eq(session_id.as_str()))
            .filter(cart::Column::UserId.is_null()),
    }
}

/// Finds the cart belonging to `owner`, if any.
pub async fn find_cart<C>(db: &C, owner: &Owner) -> Result<Option<cart::Model>>
where
    C: ConnectionTrait,
{
    select_cart(owner).one(db).await.map_err(Into::into)
}

/// Finds the cart belonging to `owner`, creating an empty one if needed.
pub async fn find_or_create_cart<C>(db: &C, owner: &Owner) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_cart(db, owner).await? {
        return Ok(existing);
    }

    let (user_id, session_cart_id) = match owner {
        Owner::User(user_id) => (Some(user_id.clone()), None),
        Owner::Guest(session_id) => (None, Some(session_id.clone())),
    };
    let now = chrono::Utc::now();
    let cart = cart::ActiveModel {
        user_id: Set(user_id),
        session_cart_id: Set(session_cart_id),
        items_price: Set(0),
        shipping_price: Set(0),
        total_price: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!("Created cart {} for {:?}", cart.id, owner);
    Ok(cart)
}

/// Loads the lines of cart `cart_id` with their products, oldest first.
///
/// Lines whose product has disappeared are left out.
pub async fn get_cart_lines<C>(db: &C, cart_id: i64) -> Result<Vec<CartLine>>
where
    C: ConnectionTrait,
{
    let rows = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|product| CartLine { item, product }))
        .collect())
}

/// Retrieves the cart of `owner` with all of its lines.
pub async fn get_cart(db: &DatabaseConnection, owner: &Owner) -> Result<Option<CartDetails>> {
    let Some(cart) = find_cart(db, owner).await? else {
        return Ok(None);
    };
    let lines = get_cart_lines(db, cart.id).await?;
    Ok(Some(CartDetails { cart, lines }))
}

/// Adds `quantity` units of a product to the owner's cart.
///
/// The cart is created if it does not exist yet. The resulting line quantity
/// is capped at the product's stock; `clamped` in the outcome reports when
/// that happened.
///
/// # Errors
/// Returns an error if:
/// - `quantity` is not positive
/// - The product does not exist
/// - No further unit can be added because the line already holds the whole stock
/// - A database operation fails (nothing is written in that case)
pub async fn add_to_cart(
    db: &DatabaseConnection,
    owner: &Owner,
    product_id: i64,
    quantity: i32,
) -> Result<AddToCartOutcome> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }

    let txn = db.begin().await?;

    let product = require_product(&txn, product_id).await?;
    let cart = find_or_create_cart(&txn, owner).await?;

    let existing = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;
    let current = existing.as_ref().map_or(0, |item| item.quantity);
    let desired = current.saturating_add(quantity);
    let new_quantity = clamp_to_stock(desired, product.stock);

    if new_quantity <= current {
        return Err(Error::InsufficientStock {
            product_id,
            requested: desired,
            available: product.stock,
        });
    }

    match existing {
        Some(item) => {
            let mut active: cart_item::ActiveModel = item.into();
            active.quantity = Set(new_quantity);
            active.update(&txn).await?;
        }
        None => {
            cart_item::ActiveModel {
                cart_id: Set(cart.id),
                product_id: Set(product_id),
                quantity: Set(new_quantity),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    let totals = update_cart_prices(&txn, cart.id).await?;
    txn.commit().await?;

    info!(
        "Cart {}: product {} now at quantity {}",
        cart.id, product_id, new_quantity
    );
    Ok(AddToCartOutcome {
        quantity: new_quantity,
        clamped: new_quantity < desired,
        totals,
    })
}

/// Removes up to `quantity` units of a product from the owner's cart.
///
/// The line is deleted when its quantity reaches zero. Removing a product
/// that is not in the cart changes nothing.
///
/// # Errors
/// Returns an error if `quantity` is not positive, the owner has no cart, or a
/// database operation fails.
pub async fn remove_from_cart(
    db: &DatabaseConnection,
    owner: &Owner,
    product_id: i64,
    quantity: i32,
) -> Result<RemoveFromCartOutcome> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }

    let txn = db.begin().await?;

    let cart = find_cart(&txn, owner).await?.ok_or(Error::CartNotFound)?;
    let existing = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let remaining = match existing {
        Some(item) if item.quantity > quantity => {
            let remaining = item.quantity - quantity;
            let mut active: cart_item::ActiveModel = item.into();
            active.quantity = Set(remaining);
            active.update(&txn).await?;
            remaining
        }
        Some(item) => {
            item.delete(&txn).await?;
            0
        }
        None => 0,
    };

    let totals = update_cart_prices(&txn, cart.id).await?;
    txn.commit().await?;

    Ok(RemoveFromCartOutcome { remaining, totals })
}

/// Deletes a cart and all of its lines.
pub(crate) async fn delete_cart<C>(db: &C, cart_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .exec(db)
        .await?;
    Cart::delete_by_id(cart_id).exec(db).await?;
    Ok(())
}

/// Deletes the owner's cart entirely.
///
/// Returns false when the owner had no cart.
pub async fn clear_cart(db: &DatabaseConnection, owner: &Owner) -> Result<bool> {
    let txn = db.begin().await?;
    let Some(cart) = find_cart(&txn, owner).await? else {
        return Ok(false);
    };
    delete_cart(&txn, cart.id).await?;
    txn.commit().await?;

    info!("Cleared cart {} for {:?}", cart.id, owner);
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn guest() -> Owner {
        Owner::Guest("guest-session".to_string())
    }

    #[test]
    fn test_clamp_to_stock() {
        assert_eq!(clamp_to_stock(3, 5), 3);
        assert_eq!(clamp_to_stock(6, 4), 4);
        assert_eq!(clamp_to_stock(2, 0), 0);
        assert_eq!(clamp_to_stock(2, -1), 0);
    }

    #[tokio::test]
    async fn test_add_to_cart_rejects_non_positive_quantity() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = add_to_cart(&db, &guest(), 1, 0).await;
        assert!(matches!(result, Err(Error::InvalidQuantity { quantity: 0 })));

        let result = remove_from_cart(&db, &guest(), 1, -2).await;
        assert!(matches!(result, Err(Error::InvalidQuantity { quantity: -2 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_creates_cart_lazily() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Dark 70%", 450, 10).await?;

        assert!(get_cart(&db, &guest()).await?.is_none());

        let outcome = add_to_cart(&db, &guest(), product.id, 2).await?;
        assert_eq!(outcome.quantity, 2);
        assert!(!outcome.clamped);
        assert_eq!(outcome.totals.total_price, 900);

        let details = get_cart(&db, &guest()).await?.unwrap();
        assert_eq!(details.cart.session_cart_id.as_deref(), Some("guest-session"));
        assert_eq!(details.cart.user_id, None);
        assert_eq!(details.lines.len(), 1);
        assert_eq!(details.item_count(), 2);
        assert_eq!(details.cart.total_price, 900);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_accumulates_and_clamps() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Praline", 300, 4).await?;

        add_to_cart(&db, &guest(), product.id, 3).await?;
        let outcome = add_to_cart(&db, &guest(), product.id, 3).await?;
        assert_eq!(outcome.quantity, 4);
        assert!(outcome.clamped);
        assert_eq!(outcome.totals.items_price, 1200);

        // The line already holds the whole stock
        let result = add_to_cart(&db, &guest(), product.id, 1).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock {
                requested: 5,
                available: 4,
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_out_of_stock_leaves_no_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Sold Out", 300, 0).await?;

        let result = add_to_cart(&db, &guest(), product.id, 1).await;
        assert!(matches!(result, Err(Error::InsufficientStock { .. })));

        // The lazily created cart was rolled back with the failed add
        assert!(find_cart(&db, &guest()).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_unknown_product() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_to_cart(&db, &guest(), 42, 1).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_from_cart_decrements_then_deletes() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bar", 250, 10).await?;
        add_to_cart(&db, &guest(), product.id, 3).await?;

        let outcome = remove_from_cart(&db, &guest(), product.id, 1).await?;
        assert_eq!(outcome.remaining, 2);
        assert_eq!(outcome.totals.total_price, 500);

        let outcome = remove_from_cart(&db, &guest(), product.id, 5).await?;
        assert_eq!(outcome.remaining, 0);
        assert_eq!(outcome.totals.total_price, 0);

        let details = get_cart(&db, &guest()).await?.unwrap();
        assert!(details.lines.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_from_missing_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let result = remove_from_cart(&db, &guest(), 1, 1).await;
        assert!(matches!(result, Err(Error::CartNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bar", 250, 10).await?;
        add_to_cart(&db, &guest(), product.id, 1).await?;

        assert!(clear_cart(&db, &guest()).await?);
        assert!(get_cart(&db, &guest()).await?.is_none());
        assert_eq!(CartItem::find().count(&db).await?, 0);
        assert!(!clear_cart(&db, &guest()).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_user_and_guest_carts_are_separate() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bar", 250, 10).await?;
        let user = Owner::User("user-1".to_string());

        add_to_cart(&db, &guest(), product.id, 1).await?;
        add_to_cart(&db, &user, product.id, 2).await?;

        let guest_cart = get_cart(&db, &guest()).await?.unwrap();
        let user_cart = get_cart(&db, &user).await?.unwrap();
        assert_ne!(guest_cart.cart.id, user_cart.cart.id);
        assert_eq!(guest_cart.item_count(), 1);
        assert_eq!(user_cart.item_count(), 2);

        Ok(())
    }
}
