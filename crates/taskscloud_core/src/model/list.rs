//! Task list domain model.
//!
//! # Invariants
//! - `owner` is immutable and always contained in `members`.
//! - Visibility: an identity may read a list iff it is in `members`.
//! - `updated_at >= created_at`.

use super::identity::IdentityId;
use super::{normalize_name, validate_timestamps, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Store-assigned list identifier.
pub type ListId = Uuid;

/// Named, owned, membership-scoped container of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: ListId,
    pub name: String,
    pub owner: IdentityId,
    /// Serialized as `users` to match the document layout of `lists/{id}`.
    #[serde(rename = "users")]
    pub members: BTreeSet<IdentityId>,
    pub favorite: bool,
    /// Epoch milliseconds, store clock.
    pub created_at: i64,
    /// Epoch milliseconds, store clock.
    pub updated_at: i64,
}

impl TaskList {
    pub fn is_member(&self, uid: &IdentityId) -> bool {
        self.members.contains(uid)
    }

    pub fn is_owner(&self, uid: &IdentityId) -> bool {
        &self.owner == uid
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        normalize_name(&self.name)?;
        if self.owner.is_blank() || self.members.iter().any(IdentityId::is_blank) {
            return Err(ModelValidationError::BlankIdentity);
        }
        if !self.members.contains(&self.owner) {
            return Err(ModelValidationError::OwnerNotMember);
        }
        validate_timestamps(self.created_at, self.updated_at)
    }
}
