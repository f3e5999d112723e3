//! API request/response models for outbound mail endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/payment-success`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentSuccess {
    pub email: String,
    pub username: String,
    pub amount: f64,
}

/// Fields of the `POST /api/send_mail` multipart form, gathered by the handler
/// while walking the parts.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}
