//! Database repository for shopping cart items.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::Result,
        models::cart_items::{CartItemCreateDBRequest, CartItemDBResponse},
    },
    types::{abbrev_uuid, CartItemId, UserId},
};

const CART_COLUMNS: &str = "id, user_id, product_title, product_image, product_desc, product_price, quantity, added_at";

pub struct CartItems<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CartItems<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Add a product to a cart.
    ///
    /// If the user already has a line for this product title, the quantities
    /// are merged in a single upsert statement. Two concurrent adds for the
    /// same product therefore end up as one line carrying the combined
    /// quantity; the unique index on `(user_id, product_title)` makes a
    /// duplicate row impossible.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), title = %request.product_title), err)]
    pub async fn upsert(&mut self, request: &CartItemCreateDBRequest) -> Result<CartItemDBResponse> {
        let item = sqlx::query_as::<_, CartItemDBResponse>(&format!(
            r#"
            INSERT INTO cart_items (id, user_id, product_title, product_image, product_desc, product_price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, product_title)
            DO UPDATE SET
                quantity = cart_items.quantity + EXCLUDED.quantity,
                product_image = EXCLUDED.product_image,
                product_desc = EXCLUDED.product_desc,
                product_price = EXCLUDED.product_price,
                added_at = now()
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.product_title)
        .bind(&request.product_image)
        .bind(&request.product_desc)
        .bind(request.product_price)
        .bind(request.quantity)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(item)
    }

    /// List all cart lines for a user, newest first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<CartItemDBResponse>> {
        let items = sqlx::query_as::<_, CartItemDBResponse>(&format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY added_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(items)
    }

    /// Replace the quantity on a cart line. Scoped to the owning user so one
    /// user can never touch another's cart. Returns `None` when the line does
    /// not exist or belongs to someone else.
    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn set_quantity(&mut self, id: CartItemId, user_id: UserId, quantity: i32) -> Result<Option<CartItemDBResponse>> {
        let item = sqlx::query_as::<_, CartItemDBResponse>(&format!(
            r#"
            UPDATE cart_items
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(item)
    }

    /// Remove a cart line, scoped to the owning user. Returns whether a row
    /// was deleted.
    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn remove(&mut self, id: CartItemId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
