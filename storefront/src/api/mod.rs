//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/api/signup`, `/api/login`, `/api/forgot-password`,
//!   `/api/reset-password`, `/api/profile`)
//! - **Users** (`/api/user/update-*`): Profile mutations for the caller
//! - **Products** (`/api/products*`): Public reads, admin-only writes
//! - **Cart** (`/api/cart*`): Per-user shopping cart
//! - **Mail** (`/api/send_mail`, `/api/payment-success`): Outbound email
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! Interactive docs are served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
