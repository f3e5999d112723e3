//! Shared helpers for integration tests.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::PgPool;

use crate::{
    api::models::users::Role,
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    email::EmailService,
    AppState, Application, Config,
};

/// Config suitable for tests: deterministic secret, cheap Argon2 parameters,
/// and a file email transport pointed at a per-process temp directory.
pub fn create_test_config() -> Config {
    let temp_dir = std::env::temp_dir().join(format!("storefront-test-emails-{}", std::process::id()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            password: crate::config::PasswordConfig {
                // Keep hashing fast in tests
                argon2_memory_kib: 8192,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        email: crate::config::EmailConfig {
            transport: crate::config::EmailTransportConfig::File {
                path: temp_dir.to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build an [`AppState`] over the given pool with the test config.
pub fn create_test_state(pool: PgPool) -> AppState {
    create_test_state_with_config(pool, create_test_config())
}

pub fn create_test_state_with_config(pool: PgPool, config: Config) -> AppState {
    let email = EmailService::new(&config).expect("Failed to create test email service");
    AppState::builder().db(pool).config(config).email(Arc::new(email)).build()
}

/// Spin up a test server over a pre-migrated pool.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// Insert a user directly, bypassing the signup endpoint.
pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users = Users::new(&mut conn);

    users
        .create(&UserCreateDBRequest {
            username: format!("user-{}", &suffix[..8]),
            email: format!("user-{}@example.com", &suffix[..8]),
            password_hash: crate::auth::password::hash_string_with_params(
                "test-password",
                Some(crate::auth::password::Argon2Params {
                    memory_kib: 8192,
                    iterations: 1,
                    parallelism: 1,
                }),
            )
            .expect("Failed to hash test password"),
            role,
        })
        .await
        .expect("Failed to create test user")
}
