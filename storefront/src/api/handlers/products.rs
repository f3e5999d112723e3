//! Catalog handlers. Reads are public; writes require the admin role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    api::models::{
        auth::MessageResponse,
        products::{ListProductsQuery, ProductCreate, ProductResponse, ProductUpdate},
        users::CurrentUser,
    },
    auth::require_admin,
    db::handlers::{ProductFilter, Products, Repository},
    errors::Error,
    types::{Operation, ProductId},
    AppState,
};

/// List products, optionally filtered by category
#[utoipa::path(
    get,
    path = "/api/products",
    params(ListProductsQuery),
    tag = "products",
    responses(
        (status = 200, description = "Products", body = Vec<ProductResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut products_repo = Products::new(&mut pool_conn);

    let filter = ProductFilter {
        category: query.category,
        skip: query.skip.unwrap_or(0).max(0),
        limit: query.limit.unwrap_or(100).clamp(1, 500),
    };

    let products = products_repo.list(&filter).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = uuid::Uuid, Path, description = "Product ID")),
    tag = "products",
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "No such product"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_product(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<ProductResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut products_repo = Products::new(&mut pool_conn);

    let product = products_repo.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "product".to_string(),
    })?;

    Ok(Json(ProductResponse::from(product)))
}

/// Create a product (admin only)
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductCreate,
    tag = "products",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProductCreate>,
) -> Result<(StatusCode, Json<ProductResponse>), Error> {
    require_admin(&current_user, Operation::Create, "products")?;

    if request.title.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Title is required".to_string(),
        });
    }
    if request.price < 0.0 || !request.price.is_finite() {
        return Err(Error::BadRequest {
            message: "Price must be a non-negative number".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut products_repo = Products::new(&mut pool_conn);

    let created = products_repo.create(&request.into()).await?;
    info!("Product created: {} ({})", created.title, created.id);

    Ok((StatusCode::CREATED, Json(ProductResponse::from(created))))
}

/// Update a product (admin only)
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = uuid::Uuid, Path, description = "Product ID")),
    request_body = ProductUpdate,
    tag = "products",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "No such product"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ProductId>,
    Json(request): Json<ProductUpdate>,
) -> Result<Json<ProductResponse>, Error> {
    require_admin(&current_user, Operation::Update, "products")?;

    if let Some(price) = request.price {
        if price < 0.0 || !price.is_finite() {
            return Err(Error::BadRequest {
                message: "Price must be a non-negative number".to_string(),
            });
        }
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut products_repo = Products::new(&mut pool_conn);

    let updated = products_repo.update(id, &request.into()).await?;
    Ok(Json(ProductResponse::from(updated)))
}

/// Delete a product (admin only)
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = uuid::Uuid, Path, description = "Product ID")),
    tag = "products",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "No such product"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>, Error> {
    require_admin(&current_user, Operation::Delete, "products")?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut products_repo = Products::new(&mut pool_conn);

    if !products_repo.delete(id).await? {
        return Err(Error::NotFound {
            resource: "product".to_string(),
        });
    }

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
