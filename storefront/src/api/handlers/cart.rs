//! Shopping cart handlers.
//!
//! Every route derives the cart owner from the bearer token; the client never
//! supplies a user id, so one shopper cannot read or edit another's cart.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        auth::MessageResponse,
        cart::{CartAdd, CartItemResponse, CartQuantityUpdate},
        users::CurrentUser,
    },
    db::{handlers::CartItems, models::cart_items::CartItemCreateDBRequest},
    errors::Error,
    types::CartItemId,
    AppState,
};

/// Add a product to the cart
///
/// Adding a product already in the cart merges the quantities into the
/// existing line.
#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = CartAdd,
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Cart line after the add", body = CartItemResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CartAdd>,
) -> Result<(StatusCode, Json<CartItemResponse>), Error> {
    if request.product_title.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "product_title is required".to_string(),
        });
    }
    if request.quantity <= 0 {
        return Err(Error::BadRequest {
            message: "Quantity must be a positive number".to_string(),
        });
    }
    if request.product_price < 0.0 || !request.product_price.is_finite() {
        return Err(Error::BadRequest {
            message: "Price must be a non-negative number".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut cart_repo = CartItems::new(&mut pool_conn);

    let line = cart_repo
        .upsert(&CartItemCreateDBRequest {
            user_id: current_user.id,
            product_title: request.product_title,
            product_image: request.product_image,
            product_desc: request.product_desc,
            product_price: request.product_price,
            quantity: request.quantity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CartItemResponse::from(line))))
}

/// List the cart's contents
#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart lines, newest first", body = Vec<CartItemResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn get_cart(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<CartItemResponse>>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut cart_repo = CartItems::new(&mut pool_conn);

    let lines = cart_repo.list_for_user(current_user.id).await?;
    Ok(Json(lines.into_iter().map(CartItemResponse::from).collect()))
}

/// Change the quantity on a cart line
///
/// A quantity of zero removes the line; negative quantities are rejected.
#[utoipa::path(
    put,
    path = "/api/cart/update/{id}",
    params(("id" = uuid::Uuid, Path, description = "Cart line ID")),
    request_body = CartQuantityUpdate,
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated line, or a removal note for quantity zero"),
        (status = 400, description = "Negative quantity"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such line in this user's cart"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CartItemId>,
    Json(request): Json<CartQuantityUpdate>,
) -> Result<Json<serde_json::Value>, Error> {
    if request.quantity < 0 {
        return Err(Error::BadRequest {
            message: "Quantity cannot be negative".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut cart_repo = CartItems::new(&mut pool_conn);

    if request.quantity == 0 {
        if !cart_repo.remove(id, current_user.id).await? {
            return Err(Error::NotFound {
                resource: "cart item".to_string(),
            });
        }
        return Ok(Json(serde_json::json!({ "message": "Item removed from cart" })));
    }

    let updated = cart_repo
        .set_quantity(id, current_user.id, request.quantity)
        .await?
        .ok_or(Error::NotFound {
            resource: "cart item".to_string(),
        })?;

    Ok(Json(serde_json::to_value(CartItemResponse::from(updated)).map_err(|e| {
        Error::Internal {
            operation: format!("serialize cart item: {e}"),
        }
    })?))
}

/// Remove a cart line
#[utoipa::path(
    delete,
    path = "/api/cart/remove/{id}",
    params(("id" = uuid::Uuid, Path, description = "Cart line ID")),
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Line removed", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such line in this user's cart"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CartItemId>,
) -> Result<Json<MessageResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut cart_repo = CartItems::new(&mut pool_conn);

    if !cart_repo.remove(id, current_user.id).await? {
        return Err(Error::NotFound {
            resource: "cart item".to_string(),
        });
    }

    Ok(Json(MessageResponse::new("Item removed from cart")))
}
