mod common;

use common::{FakeIdentityProvider, RecordingNavigator};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use taskscloud_core::{
    GateRoutes, Identity, IdentityId, Route, SessionContext, SessionGate, SignOutOutcome,
    ViewState,
};

fn mount(
    provider: &Arc<FakeIdentityProvider>,
    navigator: &Arc<RecordingNavigator>,
) -> SessionGate {
    SessionGate::mount(
        provider.clone(),
        navigator.clone(),
        SessionContext::new(),
    )
}

#[test]
fn gate_starts_checking_and_holds_one_subscription() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();

    let gate = mount(&provider, &navigator);

    assert_eq!(gate.state(), ViewState::CheckingSession);
    assert!(gate.is_mounted());
    assert_eq!(provider.active_subscriptions(), 1);
    assert!(navigator.routes().is_empty());
}

#[test]
fn dashboard_renders_only_with_confirmed_session() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = mount(&provider, &navigator);

    assert!(!gate.may_render(Route::Dashboard));
    assert!(gate.may_render(Route::Login));

    provider.emit(None);
    assert!(!gate.may_render(Route::Dashboard));
    assert!(gate.may_render(Route::Register));

    provider.emit(Some(Identity::new("alice")));
    assert!(gate.may_render(Route::Dashboard));
    assert!(gate.may_render(Route::Home));

    provider.emit(None);
    assert!(!gate.may_render(Route::Dashboard));
}

#[test]
fn present_session_authenticates_and_redirects_once() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = mount(&provider, &navigator);

    let alice = Identity::new("alice");
    provider.emit(Some(alice.clone()));
    provider.emit(Some(alice.clone()));

    assert_eq!(gate.state(), ViewState::Authenticated(alice));
    assert_eq!(gate.context().uid(), Some(IdentityId::new("alice")));
    assert_eq!(navigator.routes(), vec![Route::Dashboard]);
}

#[test]
fn absent_session_goes_straight_to_unauthenticated_without_redirect() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = mount(&provider, &navigator);

    provider.emit(None);
    provider.emit(None);

    assert_eq!(gate.state(), ViewState::Unauthenticated);
    assert!(!gate.context().is_authenticated());
    assert!(navigator.routes().is_empty());
}

#[test]
fn identity_change_and_loss_redirect_across_the_boundary() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let context = SessionContext::new();
    let gate = SessionGate::mount(provider.clone(), navigator.clone(), context.clone());

    provider.emit(Some(Identity::new("alice")));
    provider.emit(Some(Identity::new("bob")));
    assert_eq!(context.uid(), Some(IdentityId::new("bob")));

    provider.emit(None);
    assert_eq!(gate.state(), ViewState::Unauthenticated);
    assert_eq!(context.uid(), None);
    assert_eq!(
        navigator.routes(),
        vec![Route::Dashboard, Route::Dashboard, Route::Home]
    );
}

#[test]
fn custom_routes_are_used_for_redirects() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = SessionGate::mount_with_routes(
        provider.clone(),
        navigator.clone(),
        SessionContext::new(),
        GateRoutes {
            public_landing: Route::Login,
            authenticated_landing: Route::Dashboard,
        },
    );

    provider.emit(Some(Identity::new("alice")));
    provider.emit(None);

    assert_eq!(gate.state(), ViewState::Unauthenticated);
    assert_eq!(navigator.routes(), vec![Route::Dashboard, Route::Login]);
}

#[test]
fn unmount_releases_subscription_and_ignores_late_reports() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let context = SessionContext::new();
    let gate = SessionGate::mount(provider.clone(), navigator.clone(), context.clone());

    gate.unmount();
    assert_eq!(provider.active_subscriptions(), 0);

    provider.emit(Some(Identity::new("alice")));
    assert!(!context.is_authenticated());
    assert!(navigator.routes().is_empty());
}

#[test]
fn dropping_gate_releases_subscription() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    {
        let _gate = mount(&provider, &navigator);
        assert_eq!(provider.active_subscriptions(), 1);
    }
    assert_eq!(provider.active_subscriptions(), 0);
}

#[test]
fn sign_out_requires_confirmation() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = mount(&provider, &navigator);
    provider.emit(Some(Identity::new("alice")));

    assert_eq!(gate.sign_out(|| false), SignOutOutcome::Cancelled);
    assert_eq!(*provider.sign_out_calls.lock().unwrap(), 0);
    assert!(matches!(gate.state(), ViewState::Authenticated(_)));

    assert_eq!(gate.sign_out(|| true), SignOutOutcome::SignedOut);
    assert_eq!(gate.state(), ViewState::Unauthenticated);
    assert!(!gate.context().is_authenticated());
    assert_eq!(navigator.routes(), vec![Route::Dashboard, Route::Home]);
}

#[test]
fn failed_sign_out_keeps_session() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = mount(&provider, &navigator);
    provider.emit(Some(Identity::new("alice")));
    provider.fail_sign_out.store(true, Ordering::SeqCst);

    assert_eq!(gate.sign_out(|| true), SignOutOutcome::Failed);
    assert_eq!(*provider.sign_out_calls.lock().unwrap(), 1);
    assert!(matches!(gate.state(), ViewState::Authenticated(_)));
    assert!(gate.context().is_authenticated());
    assert_eq!(navigator.routes(), vec![Route::Dashboard]);
}

#[test]
fn sign_out_without_session_is_a_no_op() {
    let provider = FakeIdentityProvider::new();
    let navigator = RecordingNavigator::new();
    let gate = mount(&provider, &navigator);

    assert_eq!(gate.sign_out(|| true), SignOutOutcome::NotSignedIn);
    assert_eq!(*provider.sign_out_calls.lock().unwrap(), 0);
}
