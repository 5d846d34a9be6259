//! Session-gated view state machine.
//!
//! # Responsibility
//! - Translate provider session reports into `ViewState` transitions.
//! - Publish the signed-in identity into the injected `SessionContext`.
//! - Issue redirects when a transition crosses the authentication boundary.
//!
//! # Invariants
//! - A mounted gate owns exactly one provider subscription; unmounting or
//!   dropping the gate releases it.
//! - The observer only holds a weak reference to gate state, so late reports
//!   after teardown are ignored.
//! - Repeated reports of the same session are not transitions and never
//!   redirect twice.
//! - A failed sign-out leaves the state untouched.

use crate::model::identity::Identity;
use crate::session::context::SessionContext;
use crate::session::provider::{IdentityProvider, SessionSubscription};
use log::{info, warn};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Which view a client may render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Waiting for the provider's first session report.
    CheckingSession,
    Unauthenticated,
    Authenticated(Identity),
}

impl ViewState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Client routes reachable from the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
        }
    }

    /// Only the dashboard requires an authenticated session.
    pub fn requires_session(self) -> bool {
        matches!(self, Self::Dashboard)
    }
}

/// Side-effect sink for client redirects.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Landing routes used when crossing the authentication boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateRoutes {
    pub public_landing: Route,
    pub authenticated_landing: Route,
}

impl Default for GateRoutes {
    fn default() -> Self {
        Self {
            public_landing: Route::Home,
            authenticated_landing: Route::Dashboard,
        }
    }
}

/// Result of an explicit sign-out request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutOutcome {
    SignedOut,
    /// The user declined the confirmation; no provider call was made.
    Cancelled,
    /// There was no authenticated session to end.
    NotSignedIn,
    /// The provider call failed; the session is still active.
    Failed,
}

/// Owner of the single session subscription for one view.
pub struct SessionGate {
    state: Arc<Mutex<ViewState>>,
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    context: SessionContext,
    routes: GateRoutes,
    subscription: Option<SessionSubscription>,
}

impl SessionGate {
    /// Mounts a gate with the default landing routes.
    pub fn mount(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        context: SessionContext,
    ) -> Self {
        Self::mount_with_routes(provider, navigator, context, GateRoutes::default())
    }

    /// Mounts a gate in `CheckingSession` and subscribes to the provider.
    pub fn mount_with_routes(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        context: SessionContext,
        routes: GateRoutes,
    ) -> Self {
        let state = Arc::new(Mutex::new(ViewState::CheckingSession));
        let mut gate = Self {
            state: Arc::clone(&state),
            provider: Arc::clone(&provider),
            navigator: Arc::clone(&navigator),
            context: context.clone(),
            routes,
            subscription: None,
        };

        let weak_state: Weak<Mutex<ViewState>> = Arc::downgrade(&state);
        let subscription = provider.observe_session(Box::new(move |session| {
            let Some(state) = weak_state.upgrade() else {
                return;
            };
            apply_session(&state, &context, navigator.as_ref(), routes, session);
        }));
        info!("event=session_observe module=session status=start");
        gate.subscription = Some(subscription);
        gate
    }

    pub fn state(&self) -> ViewState {
        lock(&self.state).clone()
    }

    /// Whether `route` may be rendered in the current state.
    ///
    /// Session-only routes render only once a session is confirmed; while the
    /// check is pending they stay hidden.
    pub fn may_render(&self, route: Route) -> bool {
        !route.requires_session() || matches!(self.state(), ViewState::Authenticated(_))
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(SessionSubscription::is_active)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Ends the session after `confirm` approves.
    ///
    /// Failures are logged and reported as `SignOutOutcome::Failed`; the view
    /// stays authenticated.
    pub fn sign_out(&self, confirm: impl FnOnce() -> bool) -> SignOutOutcome {
        if !matches!(self.state(), ViewState::Authenticated(_)) {
            return SignOutOutcome::NotSignedIn;
        }
        if !confirm() {
            info!("event=sign_out module=session status=cancelled");
            return SignOutOutcome::Cancelled;
        }

        match self.provider.sign_out() {
            Ok(()) => {
                apply_session(
                    &self.state,
                    &self.context,
                    self.navigator.as_ref(),
                    self.routes,
                    None,
                );
                info!("event=sign_out module=session status=ok");
                SignOutOutcome::SignedOut
            }
            Err(err) => {
                warn!(
                    "event=sign_out module=session status=error error_code={}",
                    err.code
                );
                SignOutOutcome::Failed
            }
        }
    }

    /// Releases the provider subscription and discards the gate.
    pub fn unmount(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            info!("event=session_observe module=session status=released");
        }
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.release();
    }
}

fn apply_session(
    state: &Mutex<ViewState>,
    context: &SessionContext,
    navigator: &dyn Navigator,
    routes: GateRoutes,
    session: Option<Identity>,
) {
    let redirect = {
        let mut current = lock(state);
        let next = match session {
            Some(identity) => ViewState::Authenticated(identity),
            None => ViewState::Unauthenticated,
        };
        if *current == next {
            return;
        }

        let redirect = redirect_for(&current, &next, routes);
        match &next {
            ViewState::Authenticated(identity) => context.publish(identity.clone()),
            _ => context.clear(),
        }
        info!(
            "event=session_transition module=session status=ok from={} to={}",
            state_label(&current),
            state_label(&next)
        );
        *current = next;
        redirect
    };

    if let Some(route) = redirect {
        navigator.redirect(route);
    }
}

fn redirect_for(current: &ViewState, next: &ViewState, routes: GateRoutes) -> Option<Route> {
    match (current, next) {
        (ViewState::Authenticated(before), ViewState::Authenticated(after)) => {
            (before.uid != after.uid).then_some(routes.authenticated_landing)
        }
        (_, ViewState::Authenticated(_)) => Some(routes.authenticated_landing),
        (ViewState::Authenticated(_), ViewState::Unauthenticated) => Some(routes.public_landing),
        _ => None,
    }
}

fn state_label(state: &ViewState) -> &'static str {
    match state {
        ViewState::CheckingSession => "checking_session",
        ViewState::Unauthenticated => "unauthenticated",
        ViewState::Authenticated(_) => "authenticated",
    }
}

fn lock(state: &Mutex<ViewState>) -> std::sync::MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
