//! Identity provider boundary.
//!
//! # Responsibility
//! - Describe the external identity provider as a trait the core can drive.
//! - Model session observation as an explicit, cancellable subscription.
//!
//! # Invariants
//! - Dropping a `SessionSubscription` unsubscribes exactly once.
//! - Persistence is chosen by the caller and handed to the provider as part
//!   of the credential exchange, never applied afterwards.

use crate::error::ErrorKind;
use crate::model::identity::Identity;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Callback invoked with the current session (`None` when signed out).
pub type SessionObserver = Box<dyn Fn(Option<Identity>) + Send + Sync + 'static>;

/// How long a signed-in session survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// Survives client restarts.
    Local,
    /// Valid for the current client lifetime only.
    Session,
}

impl Persistence {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            Self::Local
        } else {
            Self::Session
        }
    }
}

/// Federated sign-in providers offered on the login view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FederatedProvider {
    Google,
    GitHub,
}

impl FederatedProvider {
    /// Provider id as understood by the identity provider.
    pub fn provider_id(self) -> &'static str {
        match self {
            Self::Google => "google.com",
            Self::GitHub => "github.com",
        }
    }
}

/// Failure envelope for identity provider calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    /// Stable provider error code, e.g. `auth/wrong-password`.
    pub code: String,
    /// Human-readable message suitable for display.
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ProviderError
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl Error for ProviderError {}

/// Handle for one active session observation.
///
/// Cancelling (explicitly or by drop) releases the provider-side listener.
pub struct SessionSubscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl SessionSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Releases the listener now instead of at drop.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for SessionSubscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// External identity provider capability.
pub trait IdentityProvider: Send + Sync {
    /// Registers `observer` for session changes.
    ///
    /// The provider reports the current session once the check completes and
    /// again on every change, until the returned handle is released.
    fn observe_session(&self, observer: SessionObserver) -> SessionSubscription;

    fn sign_in_with_credential(
        &self,
        email: &str,
        password: &str,
        persistence: Persistence,
    ) -> ProviderResult<Identity>;

    fn sign_in_with_federated_provider(
        &self,
        provider: FederatedProvider,
        persistence: Persistence,
    ) -> ProviderResult<Identity>;

    fn sign_out(&self) -> ProviderResult<()>;

    fn register(&self, email: &str, password: &str) -> ProviderResult<Identity>;

    fn send_verification_email(&self, identity: &Identity) -> ProviderResult<()>;
}
