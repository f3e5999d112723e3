//! Common type definitions shared across layers.
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: account identifier
//! - [`ProductId`]: catalog product identifier
//! - [`CartItemId`]: cart line identifier
//!
//! [`Operation`] names the action a caller attempted, used when reporting
//! authorization failures.

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type ProductId = Uuid;
pub type CartItemId = Uuid;

/// Action being performed, for authorization error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Abbreviate a UUID to its first 8 characters for log fields.
pub fn abbrev_uuid(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
