//! Database models for catalog products.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::ProductId;

/// Database request for creating a product
#[derive(Debug, Clone)]
pub struct ProductCreateDBRequest {
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
}

/// Database request for updating a product
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdateDBRequest {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

/// Database response for a product
#[derive(Debug, Clone, FromRow)]
pub struct ProductDBResponse {
    pub id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}
