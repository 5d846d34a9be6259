//! Cross-layer error taxonomy.
//!
//! Every public error type maps onto one `ErrorKind` so view code can pick a
//! presentation without matching on layer-specific variants.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller is unauthenticated or lacks membership/ownership.
    Unauthorized,
    /// List or task id does not exist.
    NotFound,
    /// Rejected input (blank name, short password, malformed email).
    InvalidArgument,
    /// Identity provider call failed.
    ProviderError,
    /// Storage or bootstrap failure.
    Internal,
}

impl ErrorKind {
    /// Stable code used in log lines (`error_code=`).
    pub fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::ProviderError => "provider_error",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
