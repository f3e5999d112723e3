//! Profile mutation handlers: avatar, username, email, and password changes.

use axum::{extract::State, Json};
use tracing::info;

use crate::{
    api::models::{
        auth::MessageResponse,
        users::{AvatarUpdate, CurrentUser, EmailUpdate, PasswordUpdate, UserResponse, UsernameUpdate},
    },
    auth::password,
    db::{
        handlers::{Repository, Users},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Base64 data URLs for avatars can get big, but not arbitrarily so.
const MAX_AVATAR_LENGTH: usize = 500_000;

const MIN_USERNAME_LENGTH: usize = 3;

/// Update the authenticated user's avatar
#[utoipa::path(
    put,
    path = "/api/user/update-avatar",
    request_body = AvatarUpdate,
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Avatar updated", body = UserResponse),
        (status = 400, description = "Avatar too large"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_avatar(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<AvatarUpdate>,
) -> Result<Json<UserResponse>, Error> {
    if request.profile_url.is_empty() {
        return Err(Error::BadRequest {
            message: "profileUrl is required".to_string(),
        });
    }
    if request.profile_url.len() > MAX_AVATAR_LENGTH {
        return Err(Error::BadRequest {
            message: "Image too large".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let updated = user_repo
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                avatar_url: Some(request.profile_url),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Change the authenticated user's username
#[utoipa::path(
    put,
    path = "/api/user/update-username",
    request_body = UsernameUpdate,
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Username updated", body = UserResponse),
        (status = 400, description = "Username too short"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_username(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UsernameUpdate>,
) -> Result<Json<UserResponse>, Error> {
    let new_username = request.new_username.trim().to_string();
    if new_username.len() < MIN_USERNAME_LENGTH {
        return Err(Error::BadRequest {
            message: format!("Username must be at least {MIN_USERNAME_LENGTH} characters"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // Exact-match collision check, excluding the caller's own row so saving an
    // unchanged name is a no-op rather than an error
    if user_repo.username_taken(&new_username, current_user.id).await? {
        return Err(Error::Conflict {
            message: "This username is already taken".to_string(),
        });
    }

    let updated = user_repo
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                username: Some(new_username),
                ..Default::default()
            },
        )
        .await?;

    info!("User {} renamed to {}", current_user.id, updated.username);
    Ok(Json(UserResponse::from(updated)))
}

/// Change the authenticated user's email address
#[utoipa::path(
    put,
    path = "/api/user/update-email",
    request_body = EmailUpdate,
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Email updated", body = UserResponse),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Email already registered"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_email(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<EmailUpdate>,
) -> Result<Json<UserResponse>, Error> {
    let new_email = request.new_email.trim().to_string();
    if new_email.is_empty() || !new_email.contains('@') {
        return Err(Error::BadRequest {
            message: "Invalid email address".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // The unique constraint on users.email turns a taken address into a 409
    let updated = user_repo
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                email: Some(new_email),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Change the authenticated user's password
#[utoipa::path(
    put,
    path = "/api/user/update-password",
    request_body = PasswordUpdate,
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "New password invalid"),
        (status = 401, description = "Current password wrong"),
        (status = 404, description = "Account no longer exists"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PasswordUpdate>,
) -> Result<Json<MessageResponse>, Error> {
    password::validate_password(&request.new_password, &state.config.auth.password)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or(Error::NotFound {
        resource: "user".to_string(),
    })?;

    let old_password = request.old_password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&old_password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let new_password = request.new_password.clone();
    let params = password::Argon2Params::from(&state.config.auth.password);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&new_password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    user_repo
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
