//! Cart price calculation.
//!
//! A cart's price columns are derived data: `items_price` is the sum of each
//! line's effective unit price times its quantity, `shipping_price` is
//! currently always zero, and `total_price` is their sum. They are recomputed
//! from the lines every time the lines change and never edited directly.

use crate::{
    entities::{Cart, CartItem, Product, cart, cart_item, product},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, warn};

/// Shipping charge applied to every cart, in cents.
pub const SHIPPING_PRICE: i64 = 0;

/// The three derived price columns of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of effective unit price times quantity
    pub items_price: i64,
    /// Shipping charge
    pub shipping_price: i64,
    /// `items_price + shipping_price`
    pub total_price: i64,
}

/// Returns the price a customer pays per unit of `product` right now.
///
/// The discount price applies only while the discount is active and a
/// discount price is actually set.
#[must_use]
pub fn effective_unit_price(product: &product::Model) -> i64 {
    match product.discount_price {
        Some(discount) if product.is_discount_active => discount,
        _ => product.price,
    }
}

/// Computes cart totals from `(quantity, product)` lines.
#[must_use]
pub fn calculate_totals<'a, I>(lines: I) -> CartTotals
where
    I: IntoIterator<Item = (i32, &'a product::Model)>,
{
    let items_price = lines
        .into_iter()
        .map(|(quantity, product)| effective_unit_price(product) * i64::from(quantity))
        .sum();

    CartTotals {
        items_price,
        shipping_price: SHIPPING_PRICE,
        total_price: items_price + SHIPPING_PRICE,
    }
}

/// Recomputes and stores the price columns of cart `cart_id`.
///
/// Works on a plain connection or inside an open transaction. Lines whose
/// product no longer exists contribute nothing.
///
/// # Errors
/// Returns [`Error::CartNotFound`] if the cart does not exist, or a database
/// error if loading or saving fails.
pub async fn update_cart_prices<C>(db: &C, cart_id: i64) -> Result<CartTotals>
where
    C: ConnectionTrait,
{
    let cart = Cart::find_by_id(cart_id)
        .one(db)
        .await?
        .ok_or(Error::CartNotFound)?;

    let lines = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .find_also_related(Product)
        .all(db)
        .await?;

    let priced = lines.iter().filter_map(|(item, product)| match product {
        Some(product) => Some((item.quantity, product)),
        None => {
            warn!(
                "Cart {} line {} references missing product {}",
                cart_id, item.id, item.product_id
            );
            None
        }
    });
    let totals = calculate_totals(priced);

    let mut active: cart::ActiveModel = cart.into();
    active.items_price = Set(totals.items_price);
    active.shipping_price = Set(totals.shipping_price);
    active.total_price = Set(totals.total_price);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;

    debug!("Cart {} repriced: {:?}", cart_id, totals);
    Ok(totals)
}
