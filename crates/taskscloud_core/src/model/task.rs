//! Task domain model.
//!
//! # Invariants
//! - A task belongs to exactly one list (`list_id`) and never moves.
//! - `updated_at >= created_at`.

use super::list::ListId;
use super::{normalize_name, validate_timestamps, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned task identifier.
pub type TaskId = Uuid;

/// Unit of work inside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub list_id: ListId,
    pub name: String,
    pub description: String,
    /// Optional due date, epoch milliseconds.
    pub date: Option<i64>,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        normalize_name(&self.name)?;
        validate_timestamps(self.created_at, self.updated_at)
    }
}

/// Partial update for a task. `None` leaves a field untouched.
///
/// `date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<Option<i64>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.completed.is_none()
    }

    /// Returns a copy with the name trimmed, rejecting a blank rename.
    pub fn normalized(&self) -> Result<Self, ModelValidationError> {
        let name = match self.name.as_deref() {
            Some(name) => Some(normalize_name(name)?),
            None => None,
        };
        Ok(Self {
            name,
            ..self.clone()
        })
    }
}
