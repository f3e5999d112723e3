//! Authentication and authorization.
//!
//! Browser clients log in via `/api/login` with email/password and receive a
//! JWT, which they send back on protected routes in an
//! `Authorization: Bearer <token>` header.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT creation and verification

pub mod current_user;
pub mod password;
pub mod session;

use crate::{
    api::models::users::{CurrentUser, Role},
    errors::Error,
    types::Operation,
};

/// Require that the user holds the admin role.
///
/// Returns 403 Forbidden for non-admin users.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: &str) -> Result<(), Error> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action,
            resource: resource.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_admin_allows_admin() {
        let user = user_with_role(Role::Admin);
        assert!(require_admin(&user, Operation::Create, "products").is_ok());
    }

    #[test]
    fn test_require_admin_rejects_customer() {
        let user = user_with_role(Role::Customer);
        let err = require_admin(&user, Operation::Delete, "products").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
