//! Database layer: repositories, models, and error classification.

pub mod errors;
pub mod handlers;
pub mod models;
