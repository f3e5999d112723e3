//! API request/response models for catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest};
use crate::types::ProductId;

/// Request body for creating a product.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductCreate {
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
}

impl From<ProductCreate> for ProductCreateDBRequest {
    fn from(api: ProductCreate) -> Self {
        Self {
            title: api.title,
            image: api.image,
            description: api.description,
            price: api.price,
            category: api.category,
        }
    }
}

/// Request body for updating a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Default, ToSchema)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

impl From<ProductUpdate> for ProductUpdateDBRequest {
    fn from(api: ProductUpdate) -> Self {
        Self {
            title: api.title,
            image: api.image,
            description: api.description,
            price: api.price,
            category: api.category,
        }
    }
}

/// Public view of a product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductDBResponse> for ProductResponse {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            image: db.image,
            description: db.description,
            price: db.price,
            category: db.category,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for listing products.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListProductsQuery {
    /// Only return products in this category
    pub category: Option<String>,
    /// Number of products to skip
    pub skip: Option<i64>,
    /// Maximum number of products to return
    pub limit: Option<i64>,
}
