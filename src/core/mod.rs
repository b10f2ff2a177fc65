//! Core business logic - framework-agnostic storefront operations.
//!
//! Nothing in here knows about HTTP or cookies beyond the plain identifiers
//! in [`session`]; callers pass the request's session context and user id in
//! explicitly.

/// Cache tag computation and invalidation sinks
pub mod cache;
/// Cart lookup, add/remove/clear
pub mod cart;
/// Favorites toggle, listing and guest merge
pub mod favorites;
/// Guest cart to user cart merge
pub mod merge;
/// Checkout and order management
pub mod order;
/// Effective prices and cart totals
pub mod pricing;
/// Catalog reads and seeding
pub mod product;
/// Guest session identifiers and ownership
pub mod session;
/// Merge hook run after authentication
pub mod sign_in;
