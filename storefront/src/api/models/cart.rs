//! API request/response models for the shopping cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::cart_items::CartItemDBResponse;
use crate::types::CartItemId;

fn default_quantity() -> i32 {
    1
}

/// Request body for `POST /api/cart/add`.
///
/// The cart stores a snapshot of the product at the moment it is added, so
/// later catalog edits don't rewrite what the shopper put in their basket.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartAdd {
    pub product_title: String,
    pub product_image: Option<String>,
    pub product_desc: Option<String>,
    pub product_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Request body for `PUT /api/cart/update/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartQuantityUpdate {
    pub quantity: i32,
}

/// A cart line as returned to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CartItemId,
    pub product_title: String,
    pub product_image: Option<String>,
    pub product_desc: Option<String>,
    pub product_price: f64,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

impl From<CartItemDBResponse> for CartItemResponse {
    fn from(db: CartItemDBResponse) -> Self {
        Self {
            id: db.id,
            product_title: db.product_title,
            product_image: db.product_image,
            product_desc: db.product_desc,
            product_price: db.product_price,
            quantity: db.quantity,
            added_at: db.added_at,
        }
    }
}
