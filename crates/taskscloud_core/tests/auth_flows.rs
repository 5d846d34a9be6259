mod common;

use common::{FakeIdentityProvider, RecordingNavigator};
use std::sync::atomic::Ordering;
use taskscloud_core::{
    AuthConfig, AuthError, AuthService, ErrorKind, FederatedProvider, Persistence, Route,
    SessionContext, SessionGate, ViewState,
};

fn service(
    provider: &std::sync::Arc<FakeIdentityProvider>,
    navigator: &std::sync::Arc<RecordingNavigator>,
) -> AuthService {
    AuthService::new(provider.clone(), navigator.clone(), AuthConfig::default())
}

#[test]
fn login_passes_persistence_with_the_credential_call() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = service(&provider, &navigator);

    auth.login("alice@example.com", "correct-horse", true).unwrap();
    auth.login("alice@example.com", "correct-horse", false).unwrap();

    assert_eq!(
        *provider.sign_in_persistence.lock().unwrap(),
        vec![Persistence::Local, Persistence::Session]
    );
    assert!(auth.remember_me_default());
}

#[test]
fn successful_login_redirects_through_the_gate_only() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = SessionGate::mount(provider.clone(), navigator.clone(), SessionContext::new());
    provider.emit(None);
    let auth = service(&provider, &navigator);

    let identity = auth.login("alice@example.com", "correct-horse", true).unwrap();

    assert_eq!(gate.state(), ViewState::Authenticated(identity));
    assert_eq!(navigator.routes(), vec![Route::Dashboard]);
}

#[test]
fn rejected_credentials_surface_provider_error() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = service(&provider, &navigator);

    let err = auth
        .login("alice@example.com", "wrong", false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderError);
    match err {
        AuthError::Provider(provider_err) => assert_eq!(provider_err.code, "auth/wrong-password"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(navigator.routes().is_empty());
}

#[test]
fn blank_login_input_never_reaches_provider() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = service(&provider, &navigator);

    assert!(matches!(
        auth.login(" ", "correct-horse", true),
        Err(AuthError::InvalidArgument(_))
    ));
    assert!(provider.sign_in_persistence.lock().unwrap().is_empty());
}

#[test]
fn federated_login_uses_requested_provider() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = service(&provider, &navigator);

    auth.login_with_provider(FederatedProvider::GitHub, false)
        .unwrap();

    assert_eq!(
        *provider.federated_calls.lock().unwrap(),
        vec![FederatedProvider::GitHub]
    );
    assert_eq!(
        *provider.sign_in_persistence.lock().unwrap(),
        vec![Persistence::Session]
    );
}

#[test]
fn register_sends_verification_and_redirects_to_login() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = service(&provider, &navigator);

    let identity = auth.register(" new@example.com ", "abc123").unwrap();

    assert_eq!(
        *provider.registered.lock().unwrap(),
        vec!["new@example.com".to_string()]
    );
    assert_eq!(
        *provider.verification_sent.lock().unwrap(),
        vec![identity.uid.to_string()]
    );
    assert_eq!(navigator.routes(), vec![Route::Login]);
}

#[test]
fn register_rejects_short_password_without_provider_call() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = service(&provider, &navigator);

    let err = auth.register("new@example.com", "abc12").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(provider.registered.lock().unwrap().is_empty());
    assert!(navigator.routes().is_empty());
}

#[test]
fn register_respects_configured_minimum_length() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let auth = AuthService::new(
        provider.clone(),
        navigator.clone(),
        AuthConfig {
            min_password_len: 10,
            remember_me_default: false,
        },
    );

    assert!(matches!(
        auth.register("new@example.com", "abc123"),
        Err(AuthError::InvalidArgument(_))
    ));
    assert!(!auth.remember_me_default());
}

#[test]
fn provider_failure_during_register_skips_verification_and_redirect() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    provider.fail_register.store(true, Ordering::SeqCst);
    let auth = service(&provider, &navigator);

    let err = auth.register("taken@example.com", "abc123").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderError);
    assert!(provider.verification_sent.lock().unwrap().is_empty());
    assert!(navigator.routes().is_empty());
}
