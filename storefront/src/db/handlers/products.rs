//! Database repository for catalog products.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
    },
    types::{abbrev_uuid, ProductId},
};

const PRODUCT_COLUMNS: &str = "id, title, image, description, price, category, created_at";

/// Filter for listing products
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            skip: 0,
            limit: 100,
        }
    }
}

pub struct Products<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Products<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;
    type Filter = ProductFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductDBResponse>(&format!(
            r#"
            INSERT INTO products (id, title, image, description, price, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.image)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.category)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, ProductDBResponse>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(product)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let products = if let Some(category) = &filter.category {
            sqlx::query_as::<_, ProductDBResponse>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
            ))
            .bind(category)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?
        } else {
            sqlx::query_as::<_, ProductDBResponse>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2"
            ))
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?
        };

        Ok(products)
    }

    #[instrument(skip(self, request), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductDBResponse>(&format!(
            r#"
            UPDATE products
            SET title = COALESCE($2, title),
                image = COALESCE($3, image),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                category = COALESCE($6, category)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.title)
        .bind(&request.image)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.category)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
