//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart;
pub mod cart_item;
pub mod favorite;
pub mod order;
pub mod order_item;
pub mod product;

// Re-export the entities under their table-level names
pub use cart::Entity as Cart;
pub use cart_item::Entity as CartItem;
pub use favorite::Entity as Favorite;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
