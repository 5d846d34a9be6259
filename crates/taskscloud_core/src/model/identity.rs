//! Identity types supplied by the external identity provider.
//!
//! The `uid` is a foreign key: this crate never mints or mutates it.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque stable identifier of an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty uids never identify a caller.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for IdentityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IdentityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Authenticated principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: IdentityId,
    pub email: Option<String>,
    pub email_verified: bool,
}

impl Identity {
    /// Creates an identity with no email metadata.
    pub fn new(uid: impl Into<IdentityId>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            email_verified: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
