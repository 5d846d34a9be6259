//! Domain model for lists, tasks and the identities that own them.
//!
//! # Responsibility
//! - Define canonical data structures shared by store, cache and view code.
//! - Own field-level validation rules for persisted records.
//!
//! # Invariants
//! - Every list and task is identified by a stable store-assigned UUID.
//! - A list's members set always contains its owner.
//! - A task never exists outside the list that contains it.

pub mod identity;
pub mod list;
pub mod task;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for list/task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Name is empty after trimming whitespace.
    BlankName,
    /// `updated_at` is earlier than `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
    /// Owner is missing from the members set.
    OwnerNotMember,
    /// Identity id is empty.
    BlankIdentity,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
            Self::OwnerNotMember => write!(f, "list owner must be a member"),
            Self::BlankIdentity => write!(f, "identity id must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

/// Trims a user-supplied name, rejecting blank input.
pub fn normalize_name(name: &str) -> Result<String, ModelValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

fn validate_timestamps(created_at: i64, updated_at: i64) -> Result<(), ModelValidationError> {
    if updated_at < created_at {
        return Err(ModelValidationError::TimestampOrder {
            created_at,
            updated_at,
        });
    }
    Ok(())
}
