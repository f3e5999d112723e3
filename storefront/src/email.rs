//! Email service for account notifications and contact-form delivery.
//!
//! Supports an SMTP transport for production and a file transport for
//! development and tests, selected by configuration. Handlers receive the
//! service through [`crate::AppState`], so tests can point it at a temp
//! directory and assert on what was (or was not) written.

use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

/// A file uploaded with a contact-form submission, forwarded as an email
/// attachment.
#[derive(Debug, Clone)]
pub struct ContactAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    contact_recipient: String,
    frontend_url: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                // File transport for development/testing
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            contact_recipient: email_config.contact_recipient.clone(),
            frontend_url: config.frontend_url.clone(),
        })
    }

    /// Greet a freshly registered user.
    pub async fn send_welcome_email(&self, to_email: &str, username: &str) -> Result<(), Error> {
        let subject = format!("Welcome to {}", self.from_name);
        let body = self.create_welcome_body(username);
        self.send_html(to_email, Some(username), &subject, &body).await
    }

    /// Send a password reset link. The raw token goes into the link; it is
    /// never logged.
    pub async fn send_password_reset_email(&self, to_email: &str, username: &str, token: &str) -> Result<(), Error> {
        let reset_link = format!("{}/reset-password?token={}", self.frontend_url, token);

        let subject = "Password Reset Request";
        let body = self.create_password_reset_body(username, &reset_link);

        self.send_html(to_email, Some(username), subject, &body).await
    }

    /// Confirm a completed payment to the customer.
    pub async fn send_payment_confirmation(&self, to_email: &str, username: &str, amount: f64) -> Result<(), Error> {
        let subject = "Payment Confirmation";
        let body = self.create_payment_body(username, amount);
        self.send_html(to_email, Some(username), subject, &body).await
    }

    /// Forward a contact-form submission to the configured recipient, with the
    /// visitor's address as reply-to and any uploaded file attached.
    pub async fn send_contact_email(
        &self,
        visitor_name: &str,
        visitor_email: &str,
        subject: &str,
        body_text: &str,
        attachment: Option<ContactAttachment>,
    ) -> Result<(), Error> {
        let from = self.from_mailbox()?;
        let to = self.contact_recipient.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse contact recipient: {e}"),
        })?;
        let reply_to = format!("{visitor_name} <{visitor_email}>")
            .parse::<Mailbox>()
            .map_err(|e| Error::BadRequest {
                message: format!("Invalid email address: {e}"),
            })?;

        let html = self.create_contact_body(visitor_name, visitor_email, body_text);
        let builder = Message::builder()
            .from(from)
            .to(to)
            .reply_to(reply_to)
            .subject(subject.to_string());

        let message = match attachment {
            Some(file) => {
                let content_type = file.content_type.parse::<ContentType>().map_err(|e| Error::BadRequest {
                    message: format!("Invalid attachment content type: {e}"),
                })?;
                let part = Attachment::new(file.filename).body(file.data, content_type);
                builder.multipart(MultiPart::mixed().singlepart(SinglePart::html(html)).singlepart(part))
            }
            None => builder.multipart(MultiPart::mixed().singlepart(SinglePart::html(html))),
        }
        .map_err(|e| Error::Internal {
            operation: format!("build contact email: {e}"),
        })?;

        self.send(message).await
    }

    async fn send_html(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let from = self.from_mailbox()?;

        let to = if let Some(name) = to_name {
            format!("{name} <{to_email}>")
        } else {
            to_email.to_string()
        }
        .parse::<Mailbox>()
        .map_err(|e| Error::BadRequest {
            message: format!("Invalid email address: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        self.send(message).await
    }

    async fn send(&self, message: Message) -> Result<(), Error> {
        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn from_mailbox(&self) -> Result<Mailbox, Error> {
        format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })
    }

    fn create_welcome_body(&self, username: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Welcome</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Welcome aboard, {username}!</h2>

        <p>Your account has been created. You can sign in and start shopping right away:</p>

        <p><a href="{frontend_url}">Go to the store</a></p>

        <div class="footer">
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>"#,
            frontend_url = self.frontend_url,
        )
    }

    fn create_password_reset_body(&self, username: &str, reset_link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password Reset Request</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Password Reset Request</h2>

        <p>Hello {username},</p>

        <p>We received a request to reset your password. If you didn't make this request, you can safely ignore this email.</p>

        <p>To reset your password, click the link below:</p>

        <p><a href="{reset_link}">Reset your password</a></p>

        <p>Or copy and paste this link into your browser:</p>
        <p>{reset_link}</p>

        <p>This link will expire in 1 hour for security reasons.</p>

        <div class="footer">
            <p>If you're having trouble with the button above, copy and paste the URL into your web browser.</p>
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>"#
        )
    }

    fn create_payment_body(&self, username: &str, amount: f64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Payment Confirmation</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Payment Received</h2>

        <p>Hello {username},</p>

        <p>We have received your payment of <strong>${amount:.2}</strong>. Thank you for your order!</p>

        <div class="footer">
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>"#
        )
    }

    fn create_contact_body(&self, visitor_name: &str, visitor_email: &str, message: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Contact Form Submission</title>
</head>
<body>
    <h2>New contact form submission</h2>
    <p><strong>From:</strong> {visitor_name} ({visitor_email})</p>
    <p>{message}</p>
</body>
</html>"#
        )
    }
}
