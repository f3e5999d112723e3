//! Outbound-mail handlers: the contact form and payment confirmations.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::{
    api::models::{
        auth::MessageResponse,
        mail::{ContactForm, PaymentSuccess},
    },
    email::ContactAttachment,
    errors::Error,
    AppState,
};

/// Forward a contact-form submission, with optional attachment, to the shop's
/// support inbox
#[utoipa::path(
    post,
    path = "/api/send_mail",
    tag = "mail",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Email sent", body = MessageResponse),
        (status = 400, description = "Missing required fields"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_mail(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<MessageResponse>, Error> {
    let mut form = ContactForm::default();
    let mut attachment: Option<ContactAttachment> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart form: {e}"),
    })? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "email" => form.email = Some(read_text(field).await?),
            "subject" => form.subject = Some(read_text(field).await?),
            "message" => form.message = Some(read_text(field).await?),
            "attachment" => {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest {
                        message: format!("Failed to read attachment: {e}"),
                    })?
                    .to_vec();
                // An empty file input still submits a part; skip it
                if !data.is_empty() {
                    attachment = Some(ContactAttachment {
                        filename,
                        content_type,
                        data,
                    });
                }
            }
            _ => {}
        }
    }

    let name = form.name.filter(|s| !s.trim().is_empty()).ok_or_else(|| Error::BadRequest {
        message: "name is required".to_string(),
    })?;
    let email = form.email.filter(|s| !s.trim().is_empty()).ok_or_else(|| Error::BadRequest {
        message: "email is required".to_string(),
    })?;
    let message = form.message.filter(|s| !s.trim().is_empty()).ok_or_else(|| Error::BadRequest {
        message: "message is required".to_string(),
    })?;
    let subject = form
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "New contact form submission".to_string());

    state
        .email
        .send_contact_email(&name, &email, &subject, &message, attachment)
        .await?;

    info!("Contact form forwarded for {email}");
    Ok(Json(MessageResponse::new("Email sent successfully")))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, Error> {
    field.text().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid form field: {e}"),
    })
}

/// Email a payment confirmation to the customer
#[utoipa::path(
    post,
    path = "/api/payment-success",
    request_body = PaymentSuccess,
    tag = "mail",
    responses(
        (status = 200, description = "Confirmation sent", body = MessageResponse),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn payment_success(
    State(state): State<AppState>,
    Json(request): Json<PaymentSuccess>,
) -> Result<Json<MessageResponse>, Error> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "Invalid email address".to_string(),
        });
    }
    if request.amount < 0.0 || !request.amount.is_finite() {
        return Err(Error::BadRequest {
            message: "Amount must be a non-negative number".to_string(),
        });
    }

    state
        .email
        .send_payment_confirmation(&request.email, &request.username, request.amount)
        .await?;

    Ok(Json(MessageResponse::new("Payment confirmation sent")))
}
