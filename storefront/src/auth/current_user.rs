//! Extractor for the authenticated user.
//!
//! Protected handlers take a [`CurrentUser`] argument; the extractor reads the
//! `Authorization: Bearer <jwt>` header, verifies the token, and rejects the
//! request with 401 when the token is missing, malformed, or expired.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
    AppState,
};

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or(Error::Unauthenticated { message: None })?;

        let auth_str = auth_header.to_str().map_err(|e| Error::BadRequest {
            message: format!("Invalid authorization header: {e}"),
        })?;

        let token = auth_str.strip_prefix("Bearer ").ok_or(Error::Unauthenticated { message: None })?;

        match session::verify_session_token(token, &state.config) {
            Ok(user) => {
                trace!("Authenticated user {}", user.id);
                Ok(user)
            }
            Err(e) => {
                trace!("JWT verification failed: {:?}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        auth::session::create_session_token,
        test_utils::{create_test_config, create_test_state},
    };
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/api/profile");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_valid_bearer_token(pool: PgPool) {
        let state = create_test_state(pool);
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "shopper".to_string(),
            email: "shopper@example.com".to_string(),
            role: Role::Customer,
        };
        let token = create_session_token(&user, &state.config).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(extracted.id, user.id);
        assert_eq!(extracted.email, user.email);
        assert_eq!(extracted.role, Role::Customer);
    }

    #[sqlx::test]
    async fn test_missing_header_is_unauthorized(pool: PgPool) {
        let state = create_test_state(pool);

        let mut parts = parts_with_auth(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_non_bearer_scheme_is_unauthorized(pool: PgPool) {
        let state = create_test_state(pool);

        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_garbage_token_is_unauthorized(pool: PgPool) {
        let state = create_test_state(pool);

        let mut parts = parts_with_auth(Some("Bearer not-a-real-jwt"));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_token_signed_with_other_secret(pool: PgPool) {
        let state = create_test_state(pool);

        let mut other_config = create_test_config();
        other_config.secret_key = Some("a-completely-different-secret".to_string());
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "intruder".to_string(),
            email: "intruder@example.com".to_string(),
            role: Role::Admin,
        };
        let token = create_session_token(&user, &other_config).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
