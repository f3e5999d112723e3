//! API request/response models for users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;

/// Role determining what a user may do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

/// Public view of a user. Never carries the password hash or reset-token
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
            avatar_url: db.avatar_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// The authenticated caller, as recovered from their session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
        }
    }
}

/// Request body for `PUT /api/user/update-avatar`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvatarUpdate {
    /// New avatar: a URL or a base64 data URL
    #[serde(rename = "profileUrl")]
    pub profile_url: String,
}

/// Request body for `PUT /api/user/update-username`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UsernameUpdate {
    #[serde(rename = "newUsername")]
    pub new_username: String,
}

/// Request body for `PUT /api/user/update-email`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmailUpdate {
    #[serde(rename = "newEmail")]
    pub new_email: String,
}

/// Request body for `PUT /api/user/update-password`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordUpdate {
    #[serde(rename = "oldPassword")]
    pub old_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}
