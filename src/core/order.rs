//! Order business logic - checkout, status changes and deletion.
//!
//! Checkout turns a signed-in user's cart into an order in one database
//! transaction: the lines are re-validated against current stock, the order
//! and its lines are written with a snapshot of the effective unit prices,
//! product stock is decremented and the cart is emptied.

use crate::{
    core::{
        cart::{find_cart, get_cart_lines},
        pricing::{calculate_totals, effective_unit_price, update_cart_prices},
        session::Owner,
    },
    entities::{CartItem, Order, OrderItem, Product, cart_item, order, order_item, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, awaiting payment
    Pending,
    /// Payment received
    Paid,
    /// Handed to the courier (delivery orders)
    Shipped,
    /// Received by the customer, either delivered or picked up
    Delivered,
    /// Cancelled before completion
    Cancelled,
}

impl OrderStatus {
    /// Lowercase name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Final statuses accept no further changes.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Paid => 1,
            Self::Shipped => 2,
            Self::Delivered | Self::Cancelled => 3,
        }
    }

    /// Orders only move forward; any open order may be cancelled.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_final() {
            return false;
        }
        matches!(next, Self::Cancelled) || next.rank() > self.rank()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::InvalidEnumValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMethod {
    /// Collected in store
    Pickup,
    /// Sent to an address
    Delivery,
}

impl DeliveryMethod {
    /// Lowercase name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pickup" => Ok(Self::Pickup),
            "delivery" => Ok(Self::Delivery),
            other => Err(Error::InvalidEnumValue {
                field: "delivery_method",
                value: other.to_string(),
            }),
        }
    }
}

/// An order with its lines.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    /// The order row
    pub order: order::Model,
    /// Lines of the order
    pub items: Vec<order_item::Model>,
}

/// Places an order from the user's cart.
///
/// Every cart line is checked against the product's current stock and copied
/// into an order item with the product name and the effective unit price at
/// this moment, so later price changes do not alter the order. Product stock is
/// decremented by the ordered quantities. The cart row is kept but emptied, and
/// its prices are reset to zero.
///
/// Validation of the delivery address happens before any storage access; the
/// rest runs in one transaction.
///
/// # Arguments
/// * `user_id` - Signed-in user whose cart is checked out
/// * `delivery_method` - Pickup in store or delivery
/// * `delivery_address` - Required for delivery, ignored for pickup
///
/// # Errors
/// Returns an error if:
/// - A delivery order has no (or a blank) address
/// - The user has no cart, or the cart is empty
/// - Any line exceeds the product's current stock
/// - A database operation fails (nothing is written in that case)
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: &str,
    delivery_method: DeliveryMethod,
    delivery_address: Option<&str>,
) -> Result<OrderDetails> {
    let delivery_address = match delivery_method {
        DeliveryMethod::Pickup => None,
        DeliveryMethod::Delivery => Some(
            delivery_address
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .ok_or(Error::MissingDeliveryAddress)?
                .to_string(),
        ),
    };

    let txn = db.begin().await?;

    let cart = find_cart(&txn, &Owner::User(user_id.to_string()))
        .await?
        .ok_or(Error::CartNotFound)?;
    let lines = get_cart_lines(&txn, cart.id).await?;
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    for line in &lines {
        if line.item.quantity > line.product.stock {
            return Err(Error::InsufficientStock {
                product_id: line.product.id,
                requested: line.item.quantity,
                available: line.product.stock,
            });
        }
    }

    let totals = calculate_totals(lines.iter().map(|line| (line.item.quantity, &line.product)));
    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        user_id: Set(user_id.to_string()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        delivery_method: Set(delivery_method.as_str().to_string()),
        delivery_address: Set(delivery_address),
        items_price: Set(totals.items_price),
        shipping_price: Set(totals.shipping_price),
        total_price: Set(totals.total_price),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product.id),
            name: Set(line.product.name.clone()),
            quantity: Set(line.item.quantity),
            unit_price: Set(effective_unit_price(&line.product)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);

        Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(line.item.quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(now))
            .filter(product::Column::Id.eq(line.product.id))
            .exec(&txn)
            .await?;
    }

    CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(&txn)
        .await?;
    update_cart_prices(&txn, cart.id).await?;

    txn.commit().await?;

    info!(
        "Order {} placed by user {}: {} lines, total {}",
        order.id,
        user_id,
        items.len(),
        order.total_price
    );
    Ok(OrderDetails { order, items })
}

/// Retrieves an order with its lines.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<OrderDetails>> {
    let found = Order::find_by_id(order_id)
        .find_with_related(OrderItem)
        .all(db)
        .await?;

    Ok(found
        .into_iter()
        .next()
        .map(|(order, items)| OrderDetails { order, items }))
}

/// Lists a user's orders, newest first.
pub async fn get_orders_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves an order to a new status.
///
/// # Errors
/// Returns an error if the order does not exist, its stored status is
/// unreadable, the transition is not allowed, or the update fails.
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let current: OrderStatus = order.status.parse()?;
    if !current.can_transition_to(status) {
        return Err(Error::InvalidStatusTransition {
            id: order_id,
            from: current.to_string(),
            to: status.to_string(),
        });
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(db).await?;

    info!("Order {} moved from {} to {}", order_id, current, status);
    Ok(updated)
}

/// Deletes an order together with its lines.
///
/// # Errors
/// Returns [`Error::OrderNotFound`] if the order does not exist, or a database
/// error; nothing is deleted in either case.
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let order = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let removed = OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    order.delete(&txn).await?;

    txn.commit().await?;

    info!(
        "Deleted order {} and {} order items",
        order_id, removed.rows_affected
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::cart::{add_to_cart, get_cart};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const USER: &str = "user-7";

    fn user() -> Owner {
        Owner::User(USER.to_string())
    }

    #[test]
    fn test_status_round_trip_and_transitions() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());

        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[tokio::test]
    async fn test_place_order_requires_delivery_address() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = place_order(&db, USER, DeliveryMethod::Delivery, Some("   ")).await;
        assert!(matches!(result, Err(Error::MissingDeliveryAddress)));
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_from_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let bar = create_test_product(&db, "Bar", 450, 10).await?;
        let box_ = create_discounted_product(&db, "Box", 3000, 2400, 2).await?;
        add_to_cart(&db, &user(), bar.id, 3).await?;
        add_to_cart(&db, &user(), box_.id, 2).await?;

        let placed = place_order(&db, USER, DeliveryMethod::Delivery, Some("1 Cocoa Lane")).await?;
        assert_eq!(placed.order.status, "pending");
        assert_eq!(placed.order.delivery_method, "delivery");
        assert_eq!(placed.order.delivery_address.as_deref(), Some("1 Cocoa Lane"));
        assert_eq!(placed.order.items_price, 3 * 450 + 2 * 2400);
        assert_eq!(placed.order.total_price, placed.order.items_price);
        assert_eq!(placed.items.len(), 2);
        assert!(placed.items.iter().any(|item| item.unit_price == 2400));

        // Stock decremented
        assert_eq!(get_product(&db, bar.id).await?.stock, 7);
        assert_eq!(get_product(&db, box_.id).await?.stock, 0);

        // Cart emptied and repriced
        let cart = get_cart(&db, &user()).await?.unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.cart.total_price, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_or_missing_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let result = place_order(&db, USER, DeliveryMethod::Pickup, None).await;
        assert!(matches!(result, Err(Error::CartNotFound)));

        let product = create_test_product(&db, "Bar", 450, 10).await?;
        add_to_cart(&db, &user(), product.id, 1).await?;
        crate::core::cart::remove_from_cart(&db, &user(), product.id, 1).await?;
        let result = place_order(&db, USER, DeliveryMethod::Pickup, None).await;
        assert!(matches!(result, Err(Error::EmptyCart)));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rechecks_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bar", 450, 5).await?;
        add_to_cart(&db, &user(), product.id, 4).await?;
        set_product_stock(&db, product.id, 2).await?;

        let result = place_order(&db, USER, DeliveryMethod::Pickup, None).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock {
                requested: 4,
                available: 2,
                ..
            })
        ));

        // Nothing changed
        assert_eq!(get_product(&db, product.id).await?.stock, 2);
        assert!(get_orders_for_user(&db, USER).await?.is_empty());
        assert_eq!(get_cart(&db, &user()).await?.unwrap().item_count(), 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_status() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bar", 450, 5).await?;
        add_to_cart(&db, &user(), product.id, 1).await?;
        let placed = place_order(&db, USER, DeliveryMethod::Pickup, None).await?;
        assert_eq!(placed.order.delivery_address, None);

        let paid = update_order_status(&db, placed.order.id, OrderStatus::Paid).await?;
        assert_eq!(paid.status, "paid");

        let result = update_order_status(&db, placed.order.id, OrderStatus::Pending).await;
        assert!(matches!(result, Err(Error::InvalidStatusTransition { .. })));

        let result = update_order_status(&db, 999, OrderStatus::Paid).await;
        assert!(matches!(result, Err(Error::OrderNotFound { id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_order_removes_items() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bar", 450, 5).await?;
        add_to_cart(&db, &user(), product.id, 2).await?;
        let placed = place_order(&db, USER, DeliveryMethod::Pickup, None).await?;

        let details = get_order(&db, placed.order.id).await?.unwrap();
        assert_eq!(details.items.len(), 1);

        delete_order(&db, placed.order.id).await?;
        assert!(get_order(&db, placed.order.id).await?.is_none());
        assert_eq!(OrderItem::find().count(&db).await?, 0);

        let result = delete_order(&db, placed.order.id).await;
        assert!(matches!(result, Err(Error::OrderNotFound { .. })));

        Ok(())
    }
}
