//! Database layer models.
//!
//! These types describe what goes into and comes out of the repositories:
//! `*CreateDBRequest` / `*UpdateDBRequest` for writes, `*DBResponse` for reads.
//! They are internal to the service; API-facing types live in
//! [`crate::api::models`] and convert from these.

pub mod cart_items;
pub mod products;
pub mod users;
