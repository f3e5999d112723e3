//! API request/response models.
//!
//! These are the wire types handlers accept and return. Field names follow the
//! frontend's JSON conventions, which is why some use camelCase renames.

pub mod auth;
pub mod cart;
pub mod mail;
pub mod products;
pub mod users;
