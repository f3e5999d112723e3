//! Database repository for users.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
    types::{abbrev_uuid, UserId},
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, avatar_url, reset_token, reset_token_expires, created_at, updated_at";

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a user by email address.
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Check whether another user already holds this exact username.
    #[instrument(skip(self, username), err)]
    pub async fn username_taken(&mut self, username: &str, exclude: UserId) -> Result<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id != $2)")
            .bind(username)
            .bind(exclude)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(taken)
    }

    /// Store a fresh password reset token on the user's row, replacing any
    /// previous one.
    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn set_reset_token(
        &mut self,
        id: UserId,
        token: &str,
        expires: chrono::DateTime<chrono::Utc>,
    ) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires = $3, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(token)
        .bind(expires)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    /// Redeem a reset token: set the new password hash and clear the token in
    /// one statement, so a token can only ever be used once. Returns `None`
    /// when the token is unknown, already used, or expired.
    #[instrument(skip(self, token, password_hash), err)]
    pub async fn consume_reset_token(&mut self, token: &str, password_hash: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expires = NULL, updated_at = now()
            WHERE reset_token = $1 AND reset_token_expires > now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(password_hash)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.role)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                avatar_url = COALESCE($5, avatar_url),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.avatar_url)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::models::users::Role, db::errors::DbError};
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    fn create_request(username: &str, email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake$hash".to_string(),
            role: Role::Customer,
        }
    }

    #[sqlx::test]
    async fn test_create_and_get_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let created = users.create(&create_request("alice", "alice@example.com")).await.unwrap();
        assert_eq!(created.username, "alice");
        assert_eq!(created.role, Role::Customer);
        assert!(created.reset_token.is_none());

        let fetched = users.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "alice@example.com");

        let by_email = users.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[sqlx::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        users.create(&create_request("alice", "alice@example.com")).await.unwrap();
        let err = users.create(&create_request("other", "alice@example.com")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn test_username_taken_excludes_self(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let alice = users.create(&create_request("alice", "alice@example.com")).await.unwrap();
        let bob = users.create(&create_request("bob", "bob@example.com")).await.unwrap();

        // Alice keeping her own name is fine
        assert!(!users.username_taken("alice", alice.id).await.unwrap());
        // Bob taking alice's name is not
        assert!(users.username_taken("alice", bob.id).await.unwrap());
        // Case differs, so no collision
        assert!(!users.username_taken("Alice", bob.id).await.unwrap());
    }

    #[sqlx::test]
    async fn test_reset_token_lifecycle(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let user = users.create(&create_request("alice", "alice@example.com")).await.unwrap();
        let expires = Utc::now() + Duration::hours(1);

        let with_token = users.set_reset_token(user.id, "deadbeef", expires).await.unwrap();
        assert_eq!(with_token.reset_token.as_deref(), Some("deadbeef"));

        // Wrong token redeems nothing
        assert!(users.consume_reset_token("wrong", "$new$hash").await.unwrap().is_none());

        // Right token redeems exactly once
        let redeemed = users.consume_reset_token("deadbeef", "$new$hash").await.unwrap().unwrap();
        assert_eq!(redeemed.id, user.id);
        assert_eq!(redeemed.password_hash, "$new$hash");
        assert!(redeemed.reset_token.is_none());

        assert!(users.consume_reset_token("deadbeef", "$newer$hash").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_expired_reset_token_is_not_redeemable(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let user = users.create(&create_request("alice", "alice@example.com")).await.unwrap();
        let expires = Utc::now() - Duration::minutes(5);
        users.set_reset_token(user.id, "stale", expires).await.unwrap();

        assert!(users.consume_reset_token("stale", "$new$hash").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_partial_update(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let user = users.create(&create_request("alice", "alice@example.com")).await.unwrap();

        let updated = users
            .update(
                user.id,
                &UserUpdateDBRequest {
                    avatar_url: Some("https://cdn.example.com/a.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.avatar_url.as_deref(), Some("https://cdn.example.com/a.png"));
        // Untouched fields survive
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@example.com");
    }

    #[sqlx::test]
    async fn test_update_missing_user_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let err = users
            .update(Uuid::new_v4(), &UserUpdateDBRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn test_delete_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let user = users.create(&create_request("alice", "alice@example.com")).await.unwrap();
        assert!(users.delete(user.id).await.unwrap());
        assert!(!users.delete(user.id).await.unwrap());
        assert!(users.get_by_id(user.id).await.unwrap().is_none());
    }
}
