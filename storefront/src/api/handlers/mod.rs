//! HTTP request handlers.

pub mod auth;
pub mod cart;
pub mod mail;
pub mod products;
pub mod users;
