//! Unified error type for the storefront core.
//!
//! Every fallible operation returns [`Result`]. Storage failures surface as
//! [`Error::Database`]; the remaining variants describe business-rule
//! rejections that callers can match on.

use thiserror::Error;

/// Errors produced by storefront operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or input data
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Underlying storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (reading the catalog file, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable set to a value that is not valid Unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// The referenced product does not exist
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Product id that was looked up
        id: i64,
    },

    /// The owner has no cart
    #[error("Cart not found")]
    CartNotFound,

    /// The cart exists but holds no items
    #[error("Cart is empty")]
    EmptyCart,

    /// The referenced order does not exist
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Order id that was looked up
        id: i64,
    },

    /// Quantities must be strictly positive
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// Quantity that was rejected
        quantity: i32,
    },

    /// Prices must be non-negative
    #[error("Invalid price: {amount}")]
    InvalidPrice {
        /// Price in cents that was rejected
        amount: i64,
    },

    /// Not enough units left to satisfy the request
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        /// Product that ran short
        product_id: i64,
        /// Units the caller asked for
        requested: i32,
        /// Units currently in stock
        available: i32,
    },

    /// Delivery orders need somewhere to deliver to
    #[error("A delivery address is required for delivery orders")]
    MissingDeliveryAddress,

    /// Unknown order status or delivery method string
    #[error("Invalid value for {field}: {value}")]
    InvalidEnumValue {
        /// Which field carried the value
        field: &'static str,
        /// The rejected value
        value: String,
    },

    /// The order is already in a final state
    #[error("Order {id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Order id
        id: i64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
