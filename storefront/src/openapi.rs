//! OpenAPI documentation for the storefront API.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Bearer-token security scheme used by the protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from `/api/login`, sent as:\n\n```\nAuthorization: Bearer <token>\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::auth::forgot_password,
        api::handlers::auth::reset_password,
        api::handlers::auth::profile,
        api::handlers::users::update_avatar,
        api::handlers::users::update_username,
        api::handlers::users::update_email,
        api::handlers::users::update_password,
        api::handlers::products::list_products,
        api::handlers::products::get_product,
        api::handlers::products::create_product,
        api::handlers::products::update_product,
        api::handlers::products::delete_product,
        api::handlers::cart::add_to_cart,
        api::handlers::cart::get_cart,
        api::handlers::cart::update_cart_item,
        api::handlers::cart::remove_cart_item,
        api::handlers::mail::send_mail,
        api::handlers::mail::payment_success,
    ),
    components(schemas(
        api::models::auth::SignupRequest,
        api::models::auth::LoginRequest,
        api::models::auth::LoginResponse,
        api::models::auth::ForgotPasswordRequest,
        api::models::auth::ResetPasswordRequest,
        api::models::auth::MessageResponse,
        api::models::users::Role,
        api::models::users::UserResponse,
        api::models::users::AvatarUpdate,
        api::models::users::UsernameUpdate,
        api::models::users::EmailUpdate,
        api::models::users::PasswordUpdate,
        api::models::products::ProductCreate,
        api::models::products::ProductUpdate,
        api::models::products::ProductResponse,
        api::models::cart::CartAdd,
        api::models::cart::CartQuantityUpdate,
        api::models::cart::CartItemResponse,
        api::models::mail::PaymentSuccess,
    )),
    tags(
        (name = "authentication", description = "Account signup, login, and password recovery"),
        (name = "users", description = "Profile mutations for the authenticated user"),
        (name = "products", description = "Product catalog"),
        (name = "cart", description = "Per-user shopping cart"),
        (name = "mail", description = "Contact form and payment notifications"),
    )
)]
pub struct ApiDoc;
