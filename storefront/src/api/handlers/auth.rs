//! Authentication handlers: signup, login, and the password-reset flow.

use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::{
    api::models::{
        auth::{ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, ResetPasswordRequest, SignupRequest},
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Register a new customer account
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    if request.username.trim().is_empty() || request.email.trim().is_empty() || request.password.is_empty() {
        return Err(Error::BadRequest {
            message: "All fields are required".to_string(),
        });
    }
    if !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "Invalid email address".to_string(),
        });
    }
    password::validate_password(&request.password, &state.config.auth.password)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    if user_repo.get_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email address already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let params = password::Argon2Params::from(&state.config.auth.password);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    // A concurrent signup for the same email lands here as a unique violation,
    // which maps to 409 just like the explicit check above.
    let created = user_repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            role: Role::Customer,
        })
        .await?;

    info!("New account registered: {}", created.username);

    // Welcome email is best-effort; signup does not wait for (or fail on) it
    let email_service = state.email.clone();
    let to_email = created.email.clone();
    let to_name = created.username.clone();
    tokio::spawn(async move {
        if let Err(e) = email_service.send_welcome_email(&to_email, &to_name).await {
            error!("Failed to send welcome email: {e}");
        }
    });

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // Unknown email and wrong password produce the same response, so the
    // endpoint cannot be used to probe which addresses are registered.
    let user = user_repo
        .get_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid_credentials());
    }

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/api/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Generic acknowledgement", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // The response is identical whether or not the address is registered
    if let Some(user) = user_repo.get_by_email(&request.email).await? {
        let token = password::generate_reset_token();
        let expires = chrono::Utc::now() + state.config.auth.reset_token_duration;

        user_repo.set_reset_token(user.id, &token, expires).await?;

        if let Err(e) = state
            .email
            .send_password_reset_email(&user.email, &user.username, &token)
            .await
        {
            // The token is already stored, so don't turn a mail hiccup into an
            // enumeration signal
            error!("Failed to send password reset email: {e}");
        }
    }

    Ok(Json(MessageResponse::new(
        "If that email is registered, a password reset link has been sent",
    )))
}

/// Reset a password using a token from the reset email
#[utoipa::path(
    post,
    path = "/api/reset-password",
    request_body = ResetPasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    password::validate_password(&request.new_password, &state.config.auth.password)?;

    let new_password = request.new_password.clone();
    let params = password::Argon2Params::from(&state.config.auth.password);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&new_password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    // Unknown, used, and expired tokens all get the same answer
    match user_repo.consume_reset_token(&request.token, &password_hash).await? {
        Some(user) => {
            info!("Password reset completed for user {}", user.id);
            Ok(Json(MessageResponse::new("Password has been reset successfully")))
        }
        None => Err(Error::BadRequest {
            message: "Invalid or expired reset token".to_string(),
        }),
    }
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or(Error::NotFound {
        resource: "user".to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}
