//! Database models for shopping cart items.
//!
//! Cart lines are keyed by `(user_id, product_title)`. Adding a product the
//! user already has in their cart increments the existing line instead of
//! creating a duplicate; the upsert happens in a single statement so two
//! concurrent adds can never race each other into two rows.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{CartItemId, UserId};

/// Database request for adding a product to a cart
#[derive(Debug, Clone)]
pub struct CartItemCreateDBRequest {
    pub user_id: UserId,
    pub product_title: String,
    pub product_image: Option<String>,
    pub product_desc: Option<String>,
    pub product_price: f64,
    pub quantity: i32,
}

/// Database response for a cart line
#[derive(Debug, Clone, FromRow)]
pub struct CartItemDBResponse {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_title: String,
    pub product_image: Option<String>,
    pub product_desc: Option<String>,
    pub product_price: f64,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}
