//! Data access layer.
//!
//! Each table gets a repository struct wrapping a `&mut PgConnection`, so the
//! caller decides whether operations share a transaction or run on a plain
//! pooled connection.

pub mod cart_items;
pub mod products;
pub mod repository;
pub mod users;

pub use cart_items::CartItems;
pub use products::{ProductFilter, Products};
pub use repository::Repository;
pub use users::{UserFilter, Users};
