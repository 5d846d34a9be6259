//! Login and registration flows.
//!
//! # Responsibility
//! - Validate credential input before it reaches the identity provider.
//! - Map the "remember me" toggle onto provider persistence.
//! - Drive the post-registration verification email and redirect.
//!
//! # Invariants
//! - Persistence travels with the credential exchange call.
//! - Passwords and emails are never logged.
//! - Successful logins do not redirect here; the mounted `SessionGate`
//!   redirects when the provider reports the new session.

use crate::config::AuthConfig;
use crate::error::ErrorKind;
use crate::model::identity::Identity;
use crate::session::gate::{Navigator, Route};
use crate::session::provider::{FederatedProvider, IdentityProvider, Persistence, ProviderError};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Errors from login/registration flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidArgument(String),
    Provider(ProviderError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Provider(_) => ErrorKind::ProviderError,
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::InvalidArgument(_) => None,
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

/// Credential flows over an injected identity provider.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        config: AuthConfig,
    ) -> Self {
        Self {
            provider,
            navigator,
            config,
        }
    }

    /// Initial state of the "remember me" toggle.
    pub fn remember_me_default(&self) -> bool {
        self.config.remember_me_default
    }

    /// Signs in with email and password.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Identity, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidArgument(
                "email and password are required".to_string(),
            ));
        }

        let persistence = Persistence::from_remember_me(remember_me);
        let result = self
            .provider
            .sign_in_with_credential(email, password, persistence);
        log_sign_in("credential", persistence, &result);
        result.map_err(Into::into)
    }

    /// Signs in through a federated provider popup.
    pub fn login_with_provider(
        &self,
        provider: FederatedProvider,
        remember_me: bool,
    ) -> Result<Identity, AuthError> {
        let persistence = Persistence::from_remember_me(remember_me);
        let result = self
            .provider
            .sign_in_with_federated_provider(provider, persistence);
        log_sign_in(provider.provider_id(), persistence, &result);
        result.map_err(Into::into)
    }

    /// Creates an account, sends the verification email and redirects to
    /// the login view.
    ///
    /// # Errors
    /// - `InvalidArgument` for blank fields, a malformed email, or a
    ///   password shorter than `min_password_len` characters.
    /// - `Provider` when account creation or the verification email fails.
    pub fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = email.trim();
        validate_registration(email, password, self.config.min_password_len)?;

        let identity = self.provider.register(email, password).map_err(|err| {
            warn!(
                "event=register module=auth status=error error_code={}",
                err.code
            );
            AuthError::from(err)
        })?;
        self.provider
            .send_verification_email(&identity)
            .map_err(|err| {
                warn!(
                    "event=verification_email module=auth status=error error_code={}",
                    err.code
                );
                AuthError::from(err)
            })?;

        info!("event=register module=auth status=ok uid={}", identity.uid);
        self.navigator.redirect(Route::Login);
        Ok(identity)
    }
}

/// Checks registration input without contacting the provider.
pub fn validate_registration(
    email: &str,
    password: &str,
    min_password_len: usize,
) -> Result<(), AuthError> {
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidArgument(
            "all fields are required".to_string(),
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::InvalidArgument(
            "email address is not valid".to_string(),
        ));
    }
    if password.chars().count() < min_password_len {
        return Err(AuthError::InvalidArgument(format!(
            "password must be at least {min_password_len} characters"
        )));
    }
    Ok(())
}

fn log_sign_in(method: &str, persistence: Persistence, result: &Result<Identity, ProviderError>) {
    match result {
        Ok(identity) => info!(
            "event=sign_in module=auth status=ok method={method} persistence={:?} uid={}",
            persistence, identity.uid
        ),
        Err(err) => warn!(
            "event=sign_in module=auth status=error method={method} error_code={}",
            err.code
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_registration, AuthError};

    #[test]
    fn registration_requires_every_field() {
        assert!(matches!(
            validate_registration("", "secret1", 6),
            Err(AuthError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_registration("a@b.co", "", 6),
            Err(AuthError::InvalidArgument(_))
        ));
    }

    #[test]
    fn registration_rejects_short_password_and_bad_email() {
        let err = validate_registration("user@example.com", "abc12", 6).unwrap_err();
        assert!(err.to_string().contains("at least 6"));
        assert!(validate_registration("user@example.com", "abc123", 6).is_ok());
        assert!(validate_registration("not-an-email", "abc123", 6).is_err());
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        assert!(validate_registration("user@example.com", "ñññññ", 6).is_err());
        assert!(validate_registration("user@example.com", "ññññññ", 6).is_ok());
    }
}
